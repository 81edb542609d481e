//! Asset loading
//!
//! Mesh geometry referenced by a scene description is read from Wavefront OBJ
//! files. Path resolution lives in [`resolve`].

pub mod obj_loader;
pub mod resolve;

pub use obj_loader::{ObjError, ObjLoader};
pub use resolve::find_file;
