/// Linux name of the loopback interface, intercepted when nothing else is configured.
pub const DEFAULT_TARGET: &str = "lo";

/// Decides which interfaces get the receive handler.
///
/// Exact, case-sensitive match against a single target name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceFilter {
    target: String,
}

impl InterfaceFilter {
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into() }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn matches(&self, name: &str) -> bool {
        name == self.target
    }
}

impl Default for InterfaceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET)
    }
}
