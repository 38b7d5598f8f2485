//! Core identifier types shared by the virtual tree and its catalogs.

/// CatalogId: identifier of a directory or file record in a catalog.
///
/// Persisted identifiers are always `>= 0`; negative values are sentinels.
pub type CatalogId = i64;

/// DriveId: identifier scoping catalog records to one drive.
pub type DriveId = i64;

/// Parent id meaning "attached directly to the drive". Also Root's catalog id.
pub const DRIVE_PARENT_ID: CatalogId = -1;

/// Returns true when `id` names a real persisted record.
pub fn is_persisted(id: CatalogId) -> bool {
    id >= 0
}
