/// Limits applied while loading external schema material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Maximum bytes allowed for a compiled descriptor set file.
    pub max_descriptor_set_size: usize,
    /// Maximum bytes allowed for a JSON mapping file.
    pub max_mapping_file_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_descriptor_set_size: 16 * 1024 * 1024,
            max_mapping_file_size: 256 * 1024,
        }
    }
}
