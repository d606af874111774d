/// Generates unique local labels for the text segment.
pub struct LabelGenerator {
    counter: usize,
}

impl LabelGenerator {
    pub fn new() -> Self {
        Self { counter: 0 }
    }

    pub fn next(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{}_{}", prefix, self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_generates_ascending_labels() {
        let mut labels = LabelGenerator::new();

        assert_eq!("cc_1", labels.next("cc"));
        assert_eq!("cc_2", labels.next("cc"));
    }
}
