//! Integration tests for the site and host mapping repositories using
//! in-memory SurrealDB.

use siteward_core::error::SitewardError;
use siteward_core::models::host::CreateSiteHost;
use siteward_core::models::settings::{CompanyInfo, MailSettings};
use siteward_core::models::site::{CreateSite, UpdateSite};
use siteward_core::repository::{Pagination, SiteHostRepository, SiteRepository};
use siteward_db::repository::{SurrealSiteHostRepository, SurrealSiteRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    siteward_db::run_migrations(&db).await.unwrap();
    db
}

fn new_site(alias: &str, name: &str, folder: Option<&str>) -> CreateSite {
    CreateSite {
        id: Uuid::new_v4(),
        alias_id: alias.into(),
        site_name: name.into(),
        folder_name: folder.map(Into::into),
        preferred_host_name: None,
        is_server_admin_site: false,
        time_zone_id: "Etc/UTC".into(),
        is_closed: false,
        closed_message: None,
    }
}

// -----------------------------------------------------------------------
// Sites
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_site() {
    let repo = SurrealSiteRepository::new(setup().await);

    let input = new_site("s1", "Main", None);
    let id = input.id;
    let site = repo.create(input).await.unwrap();

    assert_eq!(site.id, id);
    assert_eq!(site.alias_id, "s1");
    assert_eq!(site.folder_name, None);
    assert_eq!(site.mail, MailSettings::default());
    assert!(site.security.allow_new_registration);

    let fetched = repo.get_by_id(id).await.unwrap();
    assert_eq!(fetched.site_name, "Main");
}

#[tokio::test]
async fn get_missing_site_is_not_found() {
    let repo = SurrealSiteRepository::new(setup().await);

    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, SitewardError::NotFound { .. }));
}

#[tokio::test]
async fn folder_names_are_stored_lower_case_and_found_case_insensitively() {
    let repo = SurrealSiteRepository::new(setup().await);

    let site = repo.create(new_site("s2", "Blog", Some("Blog"))).await.unwrap();
    assert_eq!(site.folder_name.as_deref(), Some("blog"));

    let found = repo.find_by_folder_name("BLOG").await.unwrap().unwrap();
    assert_eq!(found.id, site.id);
    assert!(repo.find_by_folder_name("shop").await.unwrap().is_none());
}

#[tokio::test]
async fn many_sites_may_have_no_folder() {
    let repo = SurrealSiteRepository::new(setup().await);

    repo.create(new_site("s1", "One", None)).await.unwrap();
    repo.create(new_site("s2", "Two", None)).await.unwrap();

    assert_eq!(repo.count_other_sites(None).await.unwrap(), 2);
}

#[tokio::test]
async fn duplicate_folder_is_rejected_by_the_store() {
    let repo = SurrealSiteRepository::new(setup().await);

    repo.create(new_site("s1", "One", Some("acme"))).await.unwrap();
    let err = repo
        .create(new_site("s2", "Two", Some("ACME")))
        .await
        .unwrap_err();

    assert!(err.is_conflict_on("folder_name"), "got {err:?}");
}

#[tokio::test]
async fn duplicate_alias_is_rejected_by_the_store() {
    let repo = SurrealSiteRepository::new(setup().await);

    repo.create(new_site("s1", "One", Some("one"))).await.unwrap();
    let err = repo
        .create(new_site("s1", "Two", Some("two")))
        .await
        .unwrap_err();

    assert!(err.is_conflict_on("alias_id"), "got {err:?}");
}

#[tokio::test]
async fn find_by_alias() {
    let repo = SurrealSiteRepository::new(setup().await);

    let site = repo.create(new_site("s7", "Seven", None)).await.unwrap();
    let found = repo.find_by_alias_id("s7").await.unwrap().unwrap();
    assert_eq!(found.id, site.id);
    assert!(repo.find_by_alias_id("s8").await.unwrap().is_none());
}

#[tokio::test]
async fn update_settings_groups_and_nullable_fields() {
    let repo = SurrealSiteRepository::new(setup().await);
    let site = repo.create(new_site("s1", "Before", Some("before"))).await.unwrap();

    let updated = repo
        .update(
            site.id,
            UpdateSite {
                site_name: Some("After".into()),
                folder_name: Some(Some("After".into())),
                company: Some(CompanyInfo {
                    name: Some("Acme Ltd".into()),
                    country: Some("NZ".into()),
                    ..Default::default()
                }),
                theme: Some(Some("dark".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.site_name, "After");
    assert_eq!(updated.folder_name.as_deref(), Some("after"));
    assert_eq!(updated.company.name.as_deref(), Some("Acme Ltd"));
    assert_eq!(updated.theme.as_deref(), Some("dark"));
    assert!(updated.updated_at >= site.updated_at);

    // The old folder is released, the new one is taken.
    assert!(repo.find_by_folder_name("before").await.unwrap().is_none());
    assert!(repo.find_by_folder_name("after").await.unwrap().is_some());

    let cleared = repo
        .update(
            site.id,
            UpdateSite {
                theme: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.theme, None);
    assert_eq!(cleared.company.name.as_deref(), Some("Acme Ltd"));
}

#[tokio::test]
async fn update_missing_site_is_not_found() {
    let repo = SurrealSiteRepository::new(setup().await);

    let err = repo
        .update(
            Uuid::new_v4(),
            UpdateSite {
                site_name: Some("Ghost".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SitewardError::NotFound { .. }));
}

#[tokio::test]
async fn empty_update_leaves_site_untouched() {
    let repo = SurrealSiteRepository::new(setup().await);
    let site = repo.create(new_site("s1", "Main", Some("main"))).await.unwrap();

    let same = repo.update(site.id, UpdateSite::default()).await.unwrap();
    assert_eq!(same.site_name, "Main");
    assert_eq!(same.updated_at, site.updated_at);

    let err = repo
        .update(Uuid::new_v4(), UpdateSite::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SitewardError::NotFound { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_creates_on_one_folder_leave_one_site() {
    let repo = SurrealSiteRepository::new(setup().await);

    let (first, second) = tokio::join!(
        repo.create(new_site("s1", "First", Some("blog"))),
        repo.create(new_site("s2", "Second", Some("blog"))),
    );

    let errors: Vec<SitewardError> = [first, second].into_iter().filter_map(Result::err).collect();
    assert_eq!(errors.len(), 1, "got {errors:?}");
    assert!(errors[0].is_conflict_on("folder_name"), "got {errors:?}");
    assert_eq!(repo.count_other_sites(None).await.unwrap(), 1);
}

#[tokio::test]
async fn count_and_list_exclude_the_given_site() {
    let repo = SurrealSiteRepository::new(setup().await);

    let main = repo.create(new_site("s1", "Alpha", None)).await.unwrap();
    for (i, name) in ["Delta", "Bravo", "Charlie"].iter().enumerate() {
        repo.create(new_site(&format!("s{}", i + 2), name, Some(&name.to_lowercase())))
            .await
            .unwrap();
    }

    assert_eq!(repo.count_other_sites(None).await.unwrap(), 4);
    assert_eq!(repo.count_other_sites(Some(main.id)).await.unwrap(), 3);

    let page = repo
        .list_other_sites(
            Some(main.id),
            Pagination {
                offset: 0,
                limit: 2,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    let names: Vec<&str> = page.items.iter().map(|s| s.site_name.as_str()).collect();
    assert_eq!(names, vec!["Bravo", "Charlie"]);
}

#[tokio::test]
async fn delete_site_removes_its_hosts() {
    let db = setup().await;
    let sites = SurrealSiteRepository::new(db.clone());
    let hosts = SurrealSiteHostRepository::new(db);

    let site = sites.create(new_site("s1", "Gone", Some("gone"))).await.unwrap();
    hosts
        .create(CreateSiteHost {
            site_id: site.id,
            host_name: "gone.example.com".into(),
        })
        .await
        .unwrap();

    sites.delete(site.id).await.unwrap();

    assert!(sites.get_by_id(site.id).await.is_err());
    assert!(
        hosts
            .find_by_host_name("gone.example.com")
            .await
            .unwrap()
            .is_none()
    );
}

// -----------------------------------------------------------------------
// Host mappings
// -----------------------------------------------------------------------

#[tokio::test]
async fn host_mapping_lifecycle() {
    let db = setup().await;
    let sites = SurrealSiteRepository::new(db.clone());
    let hosts = SurrealSiteHostRepository::new(db);
    let site = sites.create(new_site("s1", "Hosted", None)).await.unwrap();

    let a = hosts
        .create(CreateSiteHost {
            site_id: site.id,
            host_name: "b.example.com".into(),
        })
        .await
        .unwrap();
    hosts
        .create(CreateSiteHost {
            site_id: site.id,
            host_name: "a.example.com".into(),
        })
        .await
        .unwrap();

    let found = hosts.find_by_host_name("b.example.com").await.unwrap().unwrap();
    assert_eq!(found.id, a.id);
    assert_eq!(found.site_id, site.id);

    let listed = hosts.list_by_site(site.id).await.unwrap();
    let names: Vec<&str> = listed.iter().map(|h| h.host_name.as_str()).collect();
    assert_eq!(names, vec!["a.example.com", "b.example.com"]);

    hosts.delete(site.id, a.id).await.unwrap();
    assert_eq!(hosts.list_by_site(site.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn host_delete_requires_owning_site() {
    let db = setup().await;
    let sites = SurrealSiteRepository::new(db.clone());
    let hosts = SurrealSiteHostRepository::new(db);
    let owner = sites.create(new_site("s1", "Owner", None)).await.unwrap();

    let host = hosts
        .create(CreateSiteHost {
            site_id: owner.id,
            host_name: "owned.example.com".into(),
        })
        .await
        .unwrap();

    hosts.delete(Uuid::new_v4(), host.id).await.unwrap();
    assert!(
        hosts
            .find_by_host_name("owned.example.com")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn duplicate_host_is_rejected_by_the_store() {
    let db = setup().await;
    let sites = SurrealSiteRepository::new(db.clone());
    let hosts = SurrealSiteHostRepository::new(db);
    let one = sites.create(new_site("s1", "One", None)).await.unwrap();
    let two = sites.create(new_site("s2", "Two", None)).await.unwrap();

    hosts
        .create(CreateSiteHost {
            site_id: one.id,
            host_name: "shared.example.com".into(),
        })
        .await
        .unwrap();
    let err = hosts
        .create(CreateSiteHost {
            site_id: two.id,
            host_name: "shared.example.com".into(),
        })
        .await
        .unwrap_err();

    assert!(err.is_conflict_on("host_name"), "got {err:?}");
}

#[tokio::test]
async fn rejected_host_delete_is_reported() {
    let db = setup().await;
    let sites = SurrealSiteRepository::new(db.clone());
    let hosts = SurrealSiteHostRepository::new(db.clone());
    let owner = sites.create(new_site("s1", "Owner", None)).await.unwrap();
    let host = hosts
        .create(CreateSiteHost {
            site_id: owner.id,
            host_name: "owned.example.com".into(),
        })
        .await
        .unwrap();

    db.query(
        "DEFINE EVENT pin_hosts ON TABLE site_host \
         WHEN $event = 'DELETE' THEN { THROW 'host mappings are pinned' }",
    )
    .await
    .unwrap()
    .check()
    .unwrap();

    assert!(hosts.delete(owner.id, host.id).await.is_err());
    assert_eq!(hosts.list_by_site(owner.id).await.unwrap().len(), 1);
}
