//! Host name mapping domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maps a DNS host name to the site that serves it.
///
/// A host name belongs to at most one site; a site may own many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteHost {
    pub id: Uuid,
    pub site_id: Uuid,
    pub host_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSiteHost {
    pub site_id: Uuid,
    /// Already normalized (no scheme, lower case).
    pub host_name: String,
}
