use std::fmt;

/// Problems with names, descriptors, signatures, type lookup, or the binary class format
#[derive(Debug)]
pub enum Error {
    /// A class, member, or variable name is not valid in the JVM
    MalformedName(String),

    /// A raw descriptor could not be parsed
    BadDescriptor(String),

    /// A field or method signature could not be parsed at all
    BadSignature(String),

    /// The type resolver does not know this class
    MissingClass(String),

    /// The class file is truncated or inconsistent
    ClassFormat(String),

    IoError(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedName(msg) => write!(f, "malformed name: {}", msg),
            Error::BadDescriptor(msg) => write!(f, "bad descriptor: {}", msg),
            Error::BadSignature(signature) => write!(f, "bad signature '{}'", signature),
            Error::MissingClass(name) => write!(f, "cannot resolve class '{}'", name),
            Error::ClassFormat(msg) => write!(f, "invalid class file: {}", msg),
            Error::IoError(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}
