//! Recover structured declarations from JVM classes
//!
//! The pipeline has three stages:
//!
//!   - [`class_file::read_class`] decodes the binary class-file format into a [`tree::ClassNode`]
//!   - [`analyze::ClassAnalyzer`] resolves types, parses generic signatures, and replays each
//!     method body against an [`env::EmulatedFrame`]
//!   - the result is a [`model::TypeDeclaration`] holding fields, constructors, methods, and the
//!     statements recovered from their bytecode
//!
//! ### Simple example
//!
//! ```
//! use classtree::analyze::ClassAnalyzer;
//! use classtree::jvm::*;
//! use classtree::tree::ClassNode;
//!
//! # fn analyze() -> Result<(), classtree::analyze::Error> {
//! let registry = TypeRegistry::with_java_library();
//! let class = ClassNode {
//!     access: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
//!     name: String::from("me/alec/Box"),
//!     super_name: Some(String::from("java/lang/Object")),
//!     interfaces: vec![],
//!     signature: Some(String::from("<T:Ljava/lang/Object;>Ljava/lang/Object;")),
//!     fields: vec![],
//!     methods: vec![],
//! };
//! let declaration = ClassAnalyzer::new(&registry).analyze(&class)?;
//! assert_eq!(declaration.qualified_name, "me.alec.Box");
//! assert_eq!(declaration.generic_signature.len(), 1);
//! # Ok(())
//! # }
//! # analyze().unwrap();
//! ```

pub mod analyze;
pub mod class_file;
pub mod env;
pub mod jvm;
pub mod model;
pub mod tree;
mod util;

pub use util::Width;
