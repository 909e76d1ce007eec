use strum::{Display, EnumString};

/// Strategy used to hand control to the resolved handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LaunchMode {
    /// Replace the bootstrap's process image with the interpreter.
    #[default]
    Replace,
    /// Run the interpreter as a child, forwarding signals and its exit code.
    Supervise,
}

/// Errors encountered while parsing a [`LaunchMode`] from text.
pub type LaunchModeParseError = strum::ParseError;
