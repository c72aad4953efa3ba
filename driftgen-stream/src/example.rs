//! Labeled example records stamped with their stream header.

use std::sync::Arc;

use crate::header::StreamHeader;

/// One generated example: attribute values (the optional concept value
/// included) plus a class label, stamped with the header that describes the
/// columns.
#[derive(Clone, Debug, PartialEq)]
pub struct Example {
    header: Arc<StreamHeader>,
    values: Vec<f64>,
    class: usize,
}

impl Example {
    pub(crate) fn new(header: Arc<StreamHeader>, values: Vec<f64>, class: usize) -> Self {
        Self {
            header,
            values,
            class,
        }
    }

    /// Returns the attribute values in column order, the class excluded.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the class label index.
    #[must_use]
    pub fn class(&self) -> usize {
        self.class
    }

    /// Returns the symbolic class label, when the header defines one.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        self.header.class_label(self.class)
    }

    /// Returns the header this example was generated under.
    #[must_use]
    pub fn header(&self) -> &Arc<StreamHeader> {
        &self.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn examples_resolve_their_class_name_through_the_header() {
        let header = Arc::new(StreamHeader::numeric(2, 3));
        let example = Example::new(Arc::clone(&header), vec![0.5, -1.0], 2);
        assert_eq!(example.class_name(), Some("class3"));
        assert_eq!(example.values(), [0.5, -1.0]);
    }
}
