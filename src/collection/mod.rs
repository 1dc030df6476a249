mod folder;
mod save;

#[cfg(test)]
mod tests;

pub use folder::FolderCollection;
pub use save::CollectionSaver;
