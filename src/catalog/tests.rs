use crate::catalog::{
    CatalogError, CatalogManager, DeleteOutcome, DuplicateQuotePolicy, NewProduct, ProductPatch,
    ProjectPatch, find_product, find_project,
};
use crate::store::tests::{date, dec, product, project, quote};
use crate::store::{
    CategoryId, CsvRecordStore, Product, ProductId, Project, ProjectId, Quote, RecordStore,
};
use tempfile::{TempDir, tempdir};

fn manager(policy: DuplicateQuotePolicy) -> (TempDir, CatalogManager) {
    let dir = tempdir().expect("Failed to create temp directory");
    let store = CsvRecordStore::open(dir.path()).expect("Failed to open store");
    store.init().expect("Failed to init store");
    (dir, CatalogManager::new(store, policy))
}

fn new_product(name: &str, limit: &str, category: &str) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        spec: "1 kg".to_string(),
        unit: "bag".to_string(),
        limit_price: dec(limit),
        category: category.to_string(),
    }
}

#[test]
fn test_add_project_assigns_sequential_ids() {
    let (_dir, catalog) = manager(DuplicateQuotePolicy::Allow);

    let first = catalog
        .add_project("January round", date("2024-01-15"))
        .expect("Failed to add project");
    let second = catalog
        .add_project("  February round ", date("2024-02-10"))
        .expect("Failed to add project");

    assert_eq!(first.id, ProjectId::new(1));
    assert_eq!(second.id, ProjectId::new(2));
    assert_eq!(second.name, "February round");

    let projects: Vec<Project> = catalog.store.load().expect("Failed to load projects");
    assert_eq!(projects, vec![first, second]);
}

#[test]
fn test_add_project_rejects_blank_name() {
    let (_dir, catalog) = manager(DuplicateQuotePolicy::Allow);
    let result = catalog.add_project("   ", date("2024-01-15"));
    assert!(matches!(result, Err(CatalogError::EmptyName)));
}

#[test]
fn test_deleted_id_is_not_reassigned() {
    let (_dir, catalog) = manager(DuplicateQuotePolicy::Allow);
    catalog.add_project("a", date("2024-01-01")).unwrap();
    let b = catalog.add_project("b", date("2024-01-02")).unwrap();

    catalog.delete_projects(&[b.id]).unwrap();
    let c = catalog.add_project("c", date("2024-01-03")).unwrap();
    assert_eq!(c.id, ProjectId::new(3));
}

#[test]
fn test_add_product_rounds_and_validates_limit() {
    let (_dir, catalog) = manager(DuplicateQuotePolicy::Allow);

    let salt = catalog
        .add_product(new_product("Salt", "2.499", "Seasoning"))
        .expect("Failed to add product");
    assert_eq!(salt.limit_price, dec("2.50"));
    // No categories defined yet, so the category is free text.
    assert_eq!(salt.category, "Seasoning");

    let result = catalog.add_product(new_product("Air", "0.004", ""));
    assert!(matches!(result, Err(CatalogError::PriceTooLow(_))));
}

#[test]
fn test_add_product_checks_category_when_defined() {
    let (_dir, catalog) = manager(DuplicateQuotePolicy::Allow);
    catalog.add_category("Grain").unwrap();

    let result = catalog.add_product(new_product("Salt", "2.00", "Seasoning"));
    assert!(matches!(result, Err(CatalogError::UnknownCategory(name)) if name == "Seasoning"));

    let rice = catalog
        .add_product(new_product("Rice", "3.00", "Grain"))
        .expect("Failed to add product");
    assert_eq!(rice.category, "Grain");
}

#[test]
fn test_add_quote_requires_existing_references() {
    let (_dir, catalog) = manager(DuplicateQuotePolicy::Allow);
    let p = catalog.add_project("Spring", date("2024-03-01")).unwrap();
    let salt = catalog
        .add_product(new_product("Salt", "2.00", ""))
        .unwrap();

    let result = catalog.add_quote(ProjectId::new(99), salt.id, dec("1.00"));
    assert!(matches!(result, Err(CatalogError::UnknownProject(_))));

    let result = catalog.add_quote(p.id, ProductId::new(99), dec("1.00"));
    assert!(matches!(result, Err(CatalogError::UnknownProduct(_))));

    let result = catalog.add_quote(p.id, salt.id, dec("0"));
    assert!(matches!(result, Err(CatalogError::PriceTooLow(_))));

    let quotes: Vec<Quote> = catalog.store.load().unwrap();
    assert!(quotes.is_empty(), "Rejected quotes must not be stored");
}

#[test]
fn test_duplicate_quote_policy() {
    let (_dir, allow) = manager(DuplicateQuotePolicy::Allow);
    let p = allow.add_project("Spring", date("2024-03-01")).unwrap();
    let salt = allow.add_product(new_product("Salt", "2.00", "")).unwrap();
    allow.add_quote(p.id, salt.id, dec("1.80")).unwrap();
    allow.add_quote(p.id, salt.id, dec("1.90")).unwrap();
    let quotes: Vec<Quote> = allow.store.load().unwrap();
    assert_eq!(quotes.len(), 2, "Re-quoting appends under allow");

    let (_dir, reject) = manager(DuplicateQuotePolicy::Reject);
    let p = reject.add_project("Spring", date("2024-03-01")).unwrap();
    let salt = reject.add_product(new_product("Salt", "2.00", "")).unwrap();
    reject.add_quote(p.id, salt.id, dec("1.80")).unwrap();
    let result = reject.add_quote(p.id, salt.id, dec("1.90"));
    assert!(matches!(result, Err(CatalogError::DuplicateQuote { .. })));
}

#[test]
fn test_edit_project_and_product() {
    let (_dir, catalog) = manager(DuplicateQuotePolicy::Allow);
    let p = catalog.add_project("Spring", date("2024-03-01")).unwrap();
    let salt = catalog.add_product(new_product("Salt", "2.00", "")).unwrap();

    let edited = catalog
        .edit_project(
            p.id,
            ProjectPatch {
                name: Some("Spring round".to_string()),
                inquiry_date: Some(date("2024-03-05")),
            },
        )
        .expect("Failed to edit project");
    assert_eq!(edited.name, "Spring round");
    assert_eq!(edited.inquiry_date, date("2024-03-05"));
    assert_eq!(edited.created_on, p.created_on);

    let edited = catalog
        .edit_product(
            salt.id,
            ProductPatch {
                limit_price: Some(dec("2.255")),
                unit: Some("box".to_string()),
                ..Default::default()
            },
        )
        .expect("Failed to edit product");
    assert_eq!(edited.limit_price, dec("2.26"));
    assert_eq!(edited.unit, "box");
    assert_eq!(edited.name, "Salt");

    let result = catalog.edit_product(
        salt.id,
        ProductPatch {
            limit_price: Some(dec("0")),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(CatalogError::PriceTooLow(_))));

    let result = catalog.edit_project(ProjectId::new(42), ProjectPatch::default());
    assert!(matches!(result, Err(CatalogError::UnknownProject(_))));
}

#[test]
fn test_edit_category() {
    let (_dir, catalog) = manager(DuplicateQuotePolicy::Allow);
    let c = catalog.add_category("Grain").unwrap();
    let edited = catalog.edit_category(c.id, "Grains").unwrap();
    assert_eq!(edited.name, "Grains");

    let result = catalog.edit_category(CategoryId::new(7), "Spice");
    assert!(matches!(result, Err(CatalogError::UnknownCategory(_))));
}

#[test]
fn test_delete_with_nothing_selected_is_noop() {
    let (_dir, catalog) = manager(DuplicateQuotePolicy::Allow);
    catalog.add_project("Spring", date("2024-03-01")).unwrap();

    let outcome = catalog.delete_projects(&[]).unwrap();
    assert_eq!(outcome, DeleteOutcome::NothingSelected);
    let projects: Vec<Project> = catalog.store.load().unwrap();
    assert_eq!(projects.len(), 1);
}

#[test]
fn test_delete_reports_missing_ids_and_keeps_quotes() {
    let (_dir, catalog) = manager(DuplicateQuotePolicy::Allow);
    let p = catalog.add_project("Spring", date("2024-03-01")).unwrap();
    let salt = catalog.add_product(new_product("Salt", "2.00", "")).unwrap();
    let rice = catalog.add_product(new_product("Rice", "3.00", "")).unwrap();
    catalog.add_quote(p.id, salt.id, dec("1.80")).unwrap();

    let outcome = catalog
        .delete_products(&[salt.id, ProductId::new(77)])
        .unwrap();
    assert_eq!(
        outcome,
        DeleteOutcome::Deleted {
            removed: 1,
            missing: vec![77]
        }
    );

    let products: Vec<Product> = catalog.store.load().unwrap();
    assert_eq!(products, vec![rice]);
    let quotes: Vec<Quote> = catalog.store.load().unwrap();
    assert_eq!(quotes.len(), 1, "Quotes are not cascaded");

    let outcome = catalog.delete_categories(&[CategoryId::new(1)]).unwrap();
    assert_eq!(
        outcome,
        DeleteOutcome::Deleted {
            removed: 0,
            missing: vec![1]
        }
    );
}

#[test]
fn test_products_in_category() {
    let (_dir, catalog) = manager(DuplicateQuotePolicy::Allow);
    catalog.add_category("Grain").unwrap();
    catalog.add_category("Seasoning").unwrap();
    catalog.add_product(new_product("Rice", "3.00", "Grain")).unwrap();
    catalog.add_product(new_product("Salt", "2.00", "Seasoning")).unwrap();
    catalog.add_product(new_product("Oats", "4.00", "Grain")).unwrap();

    let grain: Vec<String> = catalog
        .products_in_category(Some("Grain"))
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(grain, vec!["Rice", "Oats"]);
    assert_eq!(catalog.products_in_category(None).unwrap().len(), 3);
}

#[test]
fn test_project_quotes_flags_over_limit_and_skips_missing_products() {
    let dir = tempdir().expect("Failed to create temp directory");
    let store = CsvRecordStore::open(dir.path()).expect("Failed to open store");
    store.init().unwrap();
    store.replace(&[project(1, "Spring", "2024-03-01")]).unwrap();
    store
        .replace(&[product(1, "Salt", "2.00"), product(2, "Rice", "3.00")])
        .unwrap();
    store
        .replace(&[
            quote(1, 1, "2.10"),
            quote(1, 9, "5.00"),
            quote(2, 1, "1.00"),
            quote(1, 2, "3.00"),
        ])
        .unwrap();
    let catalog = CatalogManager::new(store, DuplicateQuotePolicy::Allow);

    let view = catalog.project_quotes(ProjectId::new(1)).unwrap();
    assert_eq!(view.unresolved, 1);
    let flags: Vec<(&str, bool)> = view
        .lines
        .iter()
        .map(|l| (l.product_name.as_str(), l.over_limit))
        .collect();
    assert_eq!(flags, vec![("Salt", true), ("Rice", false)]);

    let result = catalog.project_quotes(ProjectId::new(5));
    assert!(matches!(result, Err(CatalogError::UnknownProject(_))));
}

#[test]
fn test_find_by_id_or_name() {
    let (_dir, catalog) = manager(DuplicateQuotePolicy::Allow);
    catalog.add_project("Spring", date("2024-03-01")).unwrap();
    catalog.add_project("Spring", date("2024-04-01")).unwrap();
    catalog.add_product(new_product("Salt", "2.00", "")).unwrap();
    let snapshot = catalog.snapshot().unwrap();

    assert_eq!(find_project(&snapshot, "2").unwrap().id, ProjectId::new(2));
    // Name lookups take the first match, like a name picker.
    assert_eq!(
        find_project(&snapshot, "Spring").unwrap().id,
        ProjectId::new(1)
    );
    assert!(find_project(&snapshot, "Autumn").is_none());
    assert_eq!(find_product(&snapshot, " Salt ").unwrap().id, ProductId::new(1));
    assert!(find_product(&snapshot, "3").is_none());
}

#[test]
fn test_duplicate_policy_parse() {
    assert_eq!(
        "Reject".parse::<DuplicateQuotePolicy>(),
        Ok(DuplicateQuotePolicy::Reject)
    );
    assert_eq!(
        "allow".parse::<DuplicateQuotePolicy>(),
        Ok(DuplicateQuotePolicy::Allow)
    );
    assert!("maybe".parse::<DuplicateQuotePolicy>().is_err());
}
