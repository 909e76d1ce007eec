use strum::{Display, EnumString};

/// Blob store implementation used for the handler fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StoreBackend {
    /// Shells out to the AWS CLI (`aws s3 cp`).
    #[default]
    AwsCli,
    /// Reads `<store_root>/<bucket>/<key>` from a mounted directory.
    Directory,
}

/// Errors encountered while parsing a [`StoreBackend`] from text.
pub type StoreBackendParseError = strum::ParseError;
