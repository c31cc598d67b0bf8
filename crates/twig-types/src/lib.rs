//! Foundation types for twig.
//!
//! Every other twig crate depends on `twig-types`. The types here carry no
//! behavior beyond parsing and formatting; hashing lives in `twig-crypto` and
//! node access in `twig-store`.
//!
//! # Key Types
//!
//! - [`Fingerprint`] -- 32-byte content digest used to prove equality cheaply
//! - [`ContentType`] -- how a leaf's bytes should be interpreted
//! - [`NodePath`] -- absolute, `/`-separated logical path inside a tree

pub mod content;
pub mod error;
pub mod fingerprint;
pub mod path;

pub use content::ContentType;
pub use error::TypeError;
pub use fingerprint::Fingerprint;
pub use path::NodePath;
