/// Static description of a loaded engine design: the named streams, scalar
/// parameters, and build-time constants an action set may refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct Design {
    pub name: String,
    /// Compute module that receives tick budgets and scalar parameters.
    pub module: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub scalars: Vec<String>,
    /// Slot-acquire (low latency) streams.
    pub slot_streams: Vec<String>,
    /// Tile edge length `T`, or 0 for designs that do not tile.
    pub tile_size: usize,
    /// Engine clock in MHz.
    pub frequency_mhz: u32,
}

impl Design {
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Design {
            name: name.into(),
            module: module.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            scalars: Vec::new(),
            slot_streams: Vec::new(),
            tile_size: 0,
            frequency_mhz: 0,
        }
    }

    pub fn with_input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push(name.into());
        self
    }

    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(name.into());
        self
    }

    pub fn with_scalar(mut self, name: impl Into<String>) -> Self {
        self.scalars.push(name.into());
        self
    }

    pub fn with_slot_stream(mut self, name: impl Into<String>) -> Self {
        self.slot_streams.push(name.into());
        self
    }

    pub fn with_tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_frequency_mhz(mut self, frequency_mhz: u32) -> Self {
        self.frequency_mhz = frequency_mhz;
        self
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|s| s == name)
    }

    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|s| s == name)
    }

    pub fn has_scalar(&self, name: &str) -> bool {
        self.scalars.iter().any(|s| s == name)
    }

    pub fn has_slot_stream(&self, name: &str) -> bool {
        self.slot_streams.iter().any(|s| s == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let d = Design::new("DGEMM", "TM")
            .with_input("A")
            .with_input("B")
            .with_output("C")
            .with_scalar("numTiles")
            .with_tile_size(16)
            .with_frequency_mhz(200);
        assert!(d.has_input("A") && d.has_input("B"));
        assert!(!d.has_input("C"));
        assert!(d.has_output("C"));
        assert!(d.has_scalar("numTiles"));
        assert!(!d.has_slot_stream("configWord"));
        assert_eq!((d.tile_size, d.frequency_mhz), (16, 200));
    }
}
