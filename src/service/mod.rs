//! CrudService: the resource contract shared by every entity kind.

mod crud;
pub use crud::CrudService;
