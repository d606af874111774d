/// Distinct float literals encountered during code generation. Each is
/// emitted once into the data segment and referenced by positional label.
#[derive(Debug, Default)]
pub struct FloatTable {
    values: Vec<f64>,
}

impl FloatTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The data-segment label for `value`, interning it on first sight.
    pub fn label_for(&mut self, value: f64) -> String {
        let index = self
            .values
            .iter()
            .position(|known| known.to_bits() == value.to_bits())
            .unwrap_or_else(|| {
                self.values.push(value);
                self.values.len() - 1
            });
        format!("float_{}", index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (String, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(index, &value)| (format!("float_{}", index), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_values_share_a_label() {
        let mut table = FloatTable::new();

        assert_eq!("float_0", table.label_for(1.5));
        assert_eq!("float_1", table.label_for(2.5));
        assert_eq!("float_0", table.label_for(1.5));
        assert_eq!(2, table.iter().count());
    }
}
