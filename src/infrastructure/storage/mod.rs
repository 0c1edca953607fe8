mod local_project_store;

pub use local_project_store::LocalProjectStore;
