//! Stream metadata: attribute names and class labels.

/// Describes the columns of a generated stream: attribute names, class
/// labels, and whether a leading `concept` attribute marks the generating
/// sub-concept.
///
/// The class column is always the last one.
///
/// # Examples
/// ```
/// use driftgen_stream::StreamHeader;
///
/// let header = StreamHeader::numeric(3, 2);
/// assert_eq!(header.attribute_names(), ["att1", "att2", "att3"]);
/// assert_eq!(header.class_labels(), ["class1", "class2"]);
/// assert_eq!(header.class_index(), 3);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamHeader {
    attributes: Vec<String>,
    class_labels: Vec<String>,
    concept_marked: bool,
}

impl StreamHeader {
    /// Builds a header with `num_attributes` numeric attributes (`att1` …)
    /// and `num_classes` class labels (`class1` …).
    #[must_use]
    pub fn numeric(num_attributes: usize, num_classes: usize) -> Self {
        Self {
            attributes: attribute_names(num_attributes),
            class_labels: (1..=num_classes).map(|i| format!("class{i}")).collect(),
            concept_marked: false,
        }
    }

    /// Builds a binary-class header (`class0`/`class1`) for imbalanced
    /// streams, optionally with a leading `concept` attribute.
    #[must_use]
    pub fn binary(num_attributes: usize, concept_marked: bool) -> Self {
        let mut attributes = Vec::with_capacity(num_attributes + usize::from(concept_marked));
        if concept_marked {
            attributes.push("concept".to_owned());
        }
        attributes.extend(attribute_names(num_attributes));
        Self {
            attributes,
            class_labels: vec!["class0".to_owned(), "class1".to_owned()],
            concept_marked,
        }
    }

    /// Returns the attribute column names, the optional leading `concept`
    /// column included.
    #[must_use]
    pub fn attribute_names(&self) -> &[String] {
        &self.attributes
    }

    /// Returns the class labels.
    #[must_use]
    pub fn class_labels(&self) -> &[String] {
        &self.class_labels
    }

    /// Returns the index of the class column, always the last one.
    #[must_use]
    pub fn class_index(&self) -> usize {
        self.attributes.len()
    }

    /// Returns the total number of columns, the class column included.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.attributes.len() + 1
    }

    /// Returns whether the header carries a leading `concept` attribute.
    #[must_use]
    pub fn concept_marked(&self) -> bool {
        self.concept_marked
    }

    /// Returns the label for a class index, if any.
    #[must_use]
    pub fn class_label(&self, class: usize) -> Option<&str> {
        self.class_labels.get(class).map(String::as_str)
    }

    /// Returns every column name in order, `class` last.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        let mut columns = self.attributes.clone();
        columns.push("class".to_owned());
        columns
    }
}

fn attribute_names(num_attributes: usize) -> Vec<String> {
    (1..=num_attributes).map(|i| format!("att{i}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 2)]
    #[case(4, 3)]
    fn numeric_headers_put_the_class_last(#[case] attributes: usize, #[case] classes: usize) {
        let header = StreamHeader::numeric(attributes, classes);
        assert_eq!(header.class_index(), attributes);
        assert_eq!(header.num_columns(), attributes + 1);
        assert_eq!(header.class_labels().len(), classes);
        assert_eq!(header.column_names().last().map(String::as_str), Some("class"));
    }

    #[test]
    fn binary_headers_lead_with_the_concept_column_when_marked() {
        let header = StreamHeader::binary(2, true);
        assert_eq!(header.attribute_names(), ["concept", "att1", "att2"]);
        assert_eq!(header.class_labels(), ["class0", "class1"]);
        assert!(header.concept_marked());

        let unmarked = StreamHeader::binary(2, false);
        assert_eq!(unmarked.attribute_names(), ["att1", "att2"]);
        assert!(!unmarked.concept_marked());
    }

    #[test]
    fn class_label_lookup_is_bounded() {
        let header = StreamHeader::numeric(1, 2);
        assert_eq!(header.class_label(1), Some("class2"));
        assert_eq!(header.class_label(5), None);
    }
}
