use std::{
    fs::File,
    io::{self, BufRead},
    path::Path,
};

/// Class names in the order the classifier was trained with.
pub const CLASS_NAMES: [&str; 2] = ["Defisiensi-Nutrisi", "Full-Nutrisi"];

/// Returns the trained class name at `index`.
///
/// Callers must only pass indices produced by a successful prediction, which are
/// always in `0..CLASS_NAMES.len()`.
pub fn label_for(index: usize) -> &'static str {
    CLASS_NAMES[index]
}

/// Short description of a known class, shown next to the label.
pub fn describe(label: &str) -> Option<&'static str> {
    match label {
        "Full-Nutrisi" => Some("Healthy leaf with full nutrition"),
        "Defisiensi-Nutrisi" => Some("Leaf lacking nutrients (N, P or K deficiency)"),
        _ => None,
    }
}

/// Ordered class label table, index-aligned with the model output vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl Default for LabelTable {
    fn default() -> Self {
        Self {
            labels: CLASS_NAMES.iter().map(|l| l.to_string()).collect(),
        }
    }
}

impl LabelTable {
    pub fn new(labels: Vec<String>) -> io::Result<Self> {
        if labels.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Label table must contain at least one label",
            ));
        }
        Ok(Self { labels })
    }

    /// Reads one label per line, skipping blank lines.
    pub fn from_file(filepath: &Path) -> io::Result<Self> {
        let file = File::open(filepath)?;
        let reader = io::BufReader::new(file);
        let mut labels = Vec::new();

        for line_result in reader.lines() {
            let line = line_result?;
            let label = line.trim();
            if label.is_empty() {
                continue;
            }
            if labels.iter().any(|l: &String| l == label) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Duplicate label: {}", label),
                ));
            }
            labels.push(label.to_string());
        }

        Self::new(labels)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}
