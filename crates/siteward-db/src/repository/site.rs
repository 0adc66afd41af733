//! SurrealDB implementation of [`SiteRepository`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use siteward_core::error::SitewardResult;
use siteward_core::models::settings::{
    CaptchaSettings, CompanyInfo, LoginPageContent, MailSettings, RegistrationPageContent,
    SecuritySettings, SmsSettings, SocialLoginSettings,
};
use siteward_core::models::site::{CreateSite, Site, UpdateSite};
use siteward_core::repository::{PaginatedResult, Pagination, SiteRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::retry_on_conflict;
use crate::error::DbError;

/// Projection used by every site query; the record id is returned as a
/// plain string via `meta::id(id)`.
const SITE_FIELDS: &str = "meta::id(id) AS record_id, *";

#[derive(Debug, SurrealValue)]
struct SiteRow {
    record_id: String,
    alias_id: String,
    site_name: String,
    folder_name: Option<String>,
    preferred_host_name: Option<String>,
    is_server_admin_site: bool,
    time_zone_id: String,
    theme: Option<String>,
    is_closed: bool,
    closed_message: Option<String>,
    google_analytics_profile_id: Option<String>,
    add_this_profile_id: Option<String>,
    forced_culture: Option<String>,
    forced_ui_culture: Option<String>,
    company: serde_json::Value,
    mail: serde_json::Value,
    sms: serde_json::Value,
    security: serde_json::Value,
    captcha: serde_json::Value,
    social: serde_json::Value,
    login_page: serde_json::Value,
    registration_page: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SiteRow {
    fn try_into_site(self) -> Result<Site, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid site UUID: {e}")))?;
        Ok(Site {
            id,
            alias_id: self.alias_id,
            site_name: self.site_name,
            folder_name: self.folder_name,
            preferred_host_name: self.preferred_host_name,
            is_server_admin_site: self.is_server_admin_site,
            time_zone_id: self.time_zone_id,
            theme: self.theme,
            is_closed: self.is_closed,
            closed_message: self.closed_message,
            google_analytics_profile_id: self.google_analytics_profile_id,
            add_this_profile_id: self.add_this_profile_id,
            forced_culture: self.forced_culture,
            forced_ui_culture: self.forced_ui_culture,
            company: from_group::<CompanyInfo>("company", self.company)?,
            mail: from_group::<MailSettings>("mail", self.mail)?,
            sms: from_group::<SmsSettings>("sms", self.sms)?,
            security: from_group::<SecuritySettings>("security", self.security)?,
            captcha: from_group::<CaptchaSettings>("captcha", self.captcha)?,
            social: from_group::<SocialLoginSettings>("social", self.social)?,
            login_page: from_group::<LoginPageContent>("login_page", self.login_page)?,
            registration_page: from_group::<RegistrationPageContent>(
                "registration_page",
                self.registration_page,
            )?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn from_group<T: DeserializeOwned>(name: &str, value: serde_json::Value) -> Result<T, DbError> {
    serde_json::from_value(value).map_err(|e| DbError::Decode(format!("site.{name}: {e}")))
}

fn to_group<T: Serialize>(name: &str, group: &T) -> Result<serde_json::Value, DbError> {
    serde_json::to_value(group).map_err(|e| DbError::Decode(format!("site.{name}: {e}")))
}

/// Value for the uniquely indexed `folder_key` column.
fn folder_key(id: Uuid, folder_name: Option<&str>) -> String {
    match folder_name {
        Some(name) => name.to_lowercase(),
        None => format!("#{id}"),
    }
}

/// SurrealDB implementation of the Site repository.
#[derive(Clone)]
pub struct SurrealSiteRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSiteRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_one(
        &self,
        clause: &str,
        key: &'static str,
        value: String,
    ) -> SitewardResult<Option<Site>> {
        let query = format!("SELECT {SITE_FIELDS} FROM site WHERE {clause} LIMIT 1");
        let mut result = self
            .db
            .query(query)
            .bind((key, value))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SiteRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_site()?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, input: CreateSite) -> Result<Site, DbError> {
        let id_str = input.id.to_string();
        let folder_name = input.folder_name.map(|f| f.to_lowercase());
        let key = folder_key(input.id, folder_name.as_deref());

        // Statement 0 is the CREATE, statement 1 reads it back with its id.
        let query = format!(
            "CREATE type::record('site', $id) SET \
             alias_id = $alias_id, site_name = $site_name, \
             folder_name = $folder_name, folder_key = $folder_key, \
             preferred_host_name = $preferred_host_name, \
             is_server_admin_site = $is_server_admin_site, \
             time_zone_id = $time_zone_id, \
             is_closed = $is_closed, closed_message = $closed_message, \
             mail = $mail, security = $security; \
             SELECT {SITE_FIELDS} FROM type::record('site', $id);"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("alias_id", input.alias_id))
            .bind(("site_name", input.site_name))
            .bind(("folder_name", folder_name))
            .bind(("folder_key", key))
            .bind(("preferred_host_name", input.preferred_host_name))
            .bind(("is_server_admin_site", input.is_server_admin_site))
            .bind(("time_zone_id", input.time_zone_id))
            .bind(("is_closed", input.is_closed))
            .bind(("closed_message", input.closed_message))
            .bind(("mail", to_group("mail", &MailSettings::default())?))
            .bind(("security", to_group("security", &SecuritySettings::default())?))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<SiteRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "site".into(),
            id: id_str,
        })?;

        row.try_into_site()
    }

    async fn apply_update(&self, id: Uuid, input: UpdateSite) -> Result<Site, DbError> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.site_name.is_some() {
            sets.push("site_name = $site_name");
        }
        if input.folder_name.is_some() {
            sets.push("folder_name = $folder_name");
            sets.push("folder_key = $folder_key");
        }
        if input.preferred_host_name.is_some() {
            sets.push("preferred_host_name = $preferred_host_name");
        }
        if input.time_zone_id.is_some() {
            sets.push("time_zone_id = $time_zone_id");
        }
        if input.theme.is_some() {
            sets.push("theme = $theme");
        }
        if input.is_closed.is_some() {
            sets.push("is_closed = $is_closed");
        }
        if input.closed_message.is_some() {
            sets.push("closed_message = $closed_message");
        }
        if input.google_analytics_profile_id.is_some() {
            sets.push("google_analytics_profile_id = $google_analytics_profile_id");
        }
        if input.add_this_profile_id.is_some() {
            sets.push("add_this_profile_id = $add_this_profile_id");
        }
        if input.forced_culture.is_some() {
            sets.push("forced_culture = $forced_culture");
        }
        if input.forced_ui_culture.is_some() {
            sets.push("forced_ui_culture = $forced_ui_culture");
        }
        if input.company.is_some() {
            sets.push("company = $company");
        }
        if input.mail.is_some() {
            sets.push("mail = $mail");
        }
        if input.sms.is_some() {
            sets.push("sms = $sms");
        }
        if input.security.is_some() {
            sets.push("security = $security");
        }
        if input.captcha.is_some() {
            sets.push("captcha = $captcha");
        }
        if input.social.is_some() {
            sets.push("social = $social");
        }
        if input.login_page.is_some() {
            sets.push("login_page = $login_page");
        }
        if input.registration_page.is_some() {
            sets.push("registration_page = $registration_page");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('site', $id) SET {}; \
             SELECT {SITE_FIELDS} FROM type::record('site', $id);",
            sets.join(", ")
        );

        let mut builder = self.db.query(query).bind(("id", id_str.clone()));

        if let Some(site_name) = input.site_name {
            builder = builder.bind(("site_name", site_name));
        }
        if let Some(folder_name) = input.folder_name {
            let folder_name = folder_name.map(|f| f.to_lowercase());
            builder = builder
                .bind(("folder_key", folder_key(id, folder_name.as_deref())))
                .bind(("folder_name", folder_name));
        }
        if let Some(preferred_host_name) = input.preferred_host_name {
            builder = builder.bind(("preferred_host_name", preferred_host_name));
        }
        if let Some(time_zone_id) = input.time_zone_id {
            builder = builder.bind(("time_zone_id", time_zone_id));
        }
        if let Some(theme) = input.theme {
            builder = builder.bind(("theme", theme));
        }
        if let Some(is_closed) = input.is_closed {
            builder = builder.bind(("is_closed", is_closed));
        }
        if let Some(closed_message) = input.closed_message {
            builder = builder.bind(("closed_message", closed_message));
        }
        if let Some(profile_id) = input.google_analytics_profile_id {
            builder = builder.bind(("google_analytics_profile_id", profile_id));
        }
        if let Some(profile_id) = input.add_this_profile_id {
            builder = builder.bind(("add_this_profile_id", profile_id));
        }
        if let Some(culture) = input.forced_culture {
            builder = builder.bind(("forced_culture", culture));
        }
        if let Some(culture) = input.forced_ui_culture {
            builder = builder.bind(("forced_ui_culture", culture));
        }
        if let Some(ref company) = input.company {
            builder = builder.bind(("company", to_group("company", company)?));
        }
        if let Some(ref mail) = input.mail {
            builder = builder.bind(("mail", to_group("mail", mail)?));
        }
        if let Some(ref sms) = input.sms {
            builder = builder.bind(("sms", to_group("sms", sms)?));
        }
        if let Some(ref security) = input.security {
            builder = builder.bind(("security", to_group("security", security)?));
        }
        if let Some(ref captcha) = input.captcha {
            builder = builder.bind(("captcha", to_group("captcha", captcha)?));
        }
        if let Some(ref social) = input.social {
            builder = builder.bind(("social", to_group("social", social)?));
        }
        if let Some(ref login_page) = input.login_page {
            builder = builder.bind(("login_page", to_group("login_page", login_page)?));
        }
        if let Some(ref registration_page) = input.registration_page {
            builder = builder.bind((
                "registration_page",
                to_group("registration_page", registration_page)?,
            ));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<SiteRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "site".into(),
            id: id_str,
        })?;

        row.try_into_site()
    }
}

impl<C: Connection> SiteRepository for SurrealSiteRepository<C> {
    async fn create(&self, input: CreateSite) -> SitewardResult<Site> {
        retry_on_conflict("site", || self.insert(input.clone())).await
    }

    async fn get_by_id(&self, id: Uuid) -> SitewardResult<Site> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!(
                "SELECT {SITE_FIELDS} FROM type::record('site', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SiteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "site".into(),
            id: id_str,
        })?;

        Ok(row.try_into_site()?)
    }

    async fn find_by_folder_name(&self, folder_name: &str) -> SitewardResult<Option<Site>> {
        self.find_one(
            "folder_name = $folder_name",
            "folder_name",
            folder_name.trim().to_lowercase(),
        )
        .await
    }

    async fn find_by_alias_id(&self, alias_id: &str) -> SitewardResult<Option<Site>> {
        self.find_one("alias_id = $alias_id", "alias_id", alias_id.trim().to_string())
            .await
    }

    async fn update(&self, id: Uuid, input: UpdateSite) -> SitewardResult<Site> {
        if input.is_empty() {
            return self.get_by_id(id).await;
        }
        retry_on_conflict("site", || self.apply_update(id, input.clone())).await
    }

    async fn delete(&self, id: Uuid) -> SitewardResult<()> {
        retry_on_conflict("site", || async move {
            self.db
                .query(
                    "DELETE type::record('site', $id); \
                     DELETE site_host WHERE site_id = $id;",
                )
                .bind(("id", id.to_string()))
                .await
                .map_err(DbError::from)?
                .check()
                .map_err(DbError::from)?;
            Ok::<(), DbError>(())
        })
        .await
    }

    async fn count_other_sites(&self, exclude: Option<Uuid>) -> SitewardResult<u64> {
        let exclude_str = exclude.map(|id| id.to_string()).unwrap_or_default();

        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM site \
                 WHERE meta::id(id) != $exclude GROUP ALL",
            )
            .bind(("exclude", exclude_str))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;

        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn list_other_sites(
        &self,
        exclude: Option<Uuid>,
        pagination: Pagination,
    ) -> SitewardResult<PaginatedResult<Site>> {
        let total = self.count_other_sites(exclude).await?;
        let exclude_str = exclude.map(|id| id.to_string()).unwrap_or_default();

        let mut result = self
            .db
            .query(format!(
                "SELECT {SITE_FIELDS} FROM site \
                 WHERE meta::id(id) != $exclude \
                 ORDER BY site_name ASC \
                 LIMIT $limit START $offset"
            ))
            .bind(("exclude", exclude_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SiteRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(SiteRow::try_into_site)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_key_falls_back_to_site_id() {
        let id = Uuid::new_v4();
        assert_eq!(folder_key(id, Some("Blog")), "blog");
        assert_eq!(folder_key(id, None), format!("#{id}"));
    }
}
