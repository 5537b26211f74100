//! API doc materializer - turns a model of data types into the artefacts an API
//! document shows for them.
//!
//! Given a type reference such as `Page<Order>`, the crate produces:
//!
//! - an example payload ([`example::ExampleValue`]),
//! - flat parameter rows with ids, parent ids and dotted paths ([`params::ParamNode`]),
//!   which [`tree::TreeReconstructor`] nests into a tree,
//! - multipart form entries for request bodies ([`form::FormEntry`]).
//!
//! # Architecture
//!
//! 1. [`model`] - type descriptors, the [`model::TypeModelProvider`] boundary and the
//!    loaders that fill a [`model::TypeCatalog`] from Rust sources or YAML/JSON files
//! 2. [`scanner`] - finds the Rust files of a source tree
//! 3. [`generics`] - binds type variables to concrete arguments, including inherited ones
//! 4. [`guard`] - per-build depth and revisit limits that keep recursive types finite
//! 5. [`policy`] - per-field include/skip/override decisions and naming
//! 6. [`example`], [`params`], [`form`] - the three materializers
//! 7. [`engine`] - the entry point tying a provider and a [`config::DocConfig`] together
//! 8. [`serializer`] - JSON and YAML rendering
//!
//! # Example Usage
//!
//! ```no_run
//! use apidoc_materializer::{
//!     config::{Direction, DocConfig},
//!     engine::DocEngine,
//!     model::{source::SourceLoader, TypeRef},
//!     serializer::to_json,
//! };
//! use std::path::PathBuf;
//!
//! let catalog = SourceLoader::new(PathBuf::from("./my-project")).load().unwrap();
//! let config = DocConfig::default();
//! let engine = DocEngine::new(&catalog, &config);
//!
//! let root = TypeRef::parse("Page<Order>").unwrap();
//! let rows = engine.build_params(&root, Direction::Response, &[]).unwrap();
//! println!("{}", to_json(&rows).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod example;
pub mod form;
pub mod generics;
pub mod guard;
pub mod mock;
pub mod model;
pub mod params;
pub mod policy;
pub mod scanner;
pub mod serializer;
pub mod tree;
