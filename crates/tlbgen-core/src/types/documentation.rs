//! Documentation attached to libraries and members.

/// Documentation strings of a library or a member (`GetDocumentation`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Documentation
{
    /// Name of the library or member
    pub name: String,
    /// Free-text description
    pub doc: String,
    /// Help context identifier
    pub help_context: u32,
    /// Path of the help file
    pub help_file: String,
}

impl Documentation
{
    /// Create documentation carrying only a name.
    pub fn named(name: impl Into<String>) -> Self
    {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Entry point of a function exported from a DLL (module members only)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DllEntry
{
    /// Name of the DLL exporting the function
    pub dll_name: Option<String>,
    /// Exported name, if the function is exported by name
    pub entry_name: Option<String>,
    /// Ordinal, if the function is exported by ordinal
    pub ordinal: u16,
}
