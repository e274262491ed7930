use chrono::{TimeZone, Utc};
use httpmock::prelude::*;
use ptv_sync::config::{RegionSpec, ServiceScope, SyncOptions};
use ptv_sync::domain::ports::Collection;
use ptv_sync::store::StoreOp;
use ptv_sync::{CatalogClient, MemoryStore, ServiceImporter, SyncError, SyncMode};
use serde_json::{json, Value};

fn region_spec() -> RegionSpec {
    RegionSpec {
        province_name: "Varsinais-Suomi".to_string(),
        municipality_names: vec!["Turku".to_string(), "Naantali".to_string()],
    }
}

fn mock_code_lists(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/CodeList/GetMunicipalityCodes");
        then.status(200).json_body(json!([
            {"code": "853", "names": [
                {"language": "fi", "value": "Turku"},
                {"language": "sv", "value": "Åbo"}
            ]},
            {"code": "529", "names": [
                {"language": "fi", "value": "Naantali"},
                {"language": "sv", "value": "Nådendal"}
            ]},
            {"code": "091", "names": [
                {"language": "fi", "value": "Helsinki"},
                {"language": "sv", "value": "Helsingfors"}
            ]}
        ]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/CodeList/GetAreaCodes/type/Province");
        then.status(200).json_body(json!([
            {"code": "01", "names": [{"language": "fi", "value": "Uusimaa"}]},
            {"code": "02", "names": [{"language": "fi", "value": "Varsinais-Suomi"}]}
        ]));
    });
}

fn service_details() -> Value {
    json!([
        {
            "id": "1",
            "type": "Service",
            "serviceChannels": [{"serviceChannel": {"id": "0011"}}],
            "serviceNames": [{"language": "fi", "value": "Neuvonta", "type": "Name"}],
            "targetGroups": [{"code": "KR1", "name": [{"language": "fi", "value": "Kansalaiset"}]}],
            "areas": []
        },
        {
            "id": "2",
            "type": "Service",
            "serviceChannels": [{"serviceChannel": {"id": "0012"}}],
            "serviceNames": [{"language": "fi", "value": "Kotihoiva", "type": "Name"}],
            "targetGroups": [
                {"code": "KR1", "name": [{"language": "fi", "value": "Kansalaiset"}]},
                {"code": "KR1.2", "name": [{"language": "fi", "value": "Ikääntyneet"}]}
            ],
            "areas": [{
                "type": "Municipality",
                "municipalities": [{"code": "853", "name": [{"language": "fi", "value": "Turku"}]}]
            }]
        },
        {
            "id": "3",
            "type": "Service",
            "serviceChannels": [{"serviceChannel": {"id": "0099"}}],
            "serviceNames": [{"language": "fi", "value": "Lapsiperheet", "type": "Name"}],
            "targetGroups": [{"code": "KR1.1", "name": [{"language": "fi", "value": "Lapsiperheet"}]}]
        }
    ])
}

fn location(id: &str, municipality: &str) -> Value {
    json!({
        "id": id,
        "serviceChannelType": "ServiceLocation",
        "serviceChannelNames": [{"language": "fi", "value": format!("Toimipiste {}", id)}],
        "addresses": [{
            "type": "Location",
            "subType": "Single",
            "streetAddress": {
                "postalCode": "20100",
                "street": [{"language": "fi", "value": "Aurakatu"}],
                "municipality": {"code": municipality, "name": []}
            }
        }]
    })
}

fn channel_details() -> Value {
    json!([
        {
            "id": "0011",
            "serviceChannelType": "EChannel",
            "services": [{"service": {"id": "1"}}],
            "serviceChannelNames": [{"language": "fi", "value": "Verkkoasiointi"}]
        },
        location("0012", "853"),
        location("0013", "091")
    ])
}

/// Mocks a one-page channel list for the province and both detail endpoints.
fn mock_catalog_details(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/ServiceChannel/area/Province/code/02");
        then.status(200)
            .json_body(json!({"pageCount": 1, "itemList": [{"id": "0013"}]}));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/Service/serviceWithGD/list")
            .query_param_exists("guids");
        then.status(200).json_body(service_details());
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/ServiceChannel/list")
            .query_param_exists("guids");
        then.status(200).json_body(channel_details());
    });
}

fn service_list_page() -> Value {
    json!({"pageCount": 1, "itemList": [{"id": "1"}, {"id": "2"}, {"id": "3"}]})
}

async fn importer(server: &MockServer, store: MemoryStore) -> ServiceImporter<MemoryStore> {
    let catalog = CatalogClient::with_base_url(server.base_url()).unwrap();
    ServiceImporter::new(catalog, store, &region_spec(), SyncOptions::default())
        .await
        .unwrap()
}

fn strings(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[tokio::test]
async fn test_incremental_run_replaces_fetched_records() {
    let server = MockServer::start();
    mock_code_lists(&server);
    mock_catalog_details(&server);
    let list = server.mock(|when, then| {
        when.method(GET).path("/Service").query_param_exists("date");
        then.status(200).json_body(service_list_page());
    });

    let store = MemoryStore::new();
    store
        .seed(
            Collection::Services,
            vec![
                json!({"id": "1", "lastUpdated": "2021-06-08T10:00:00Z"}),
                json!({"id": "3", "lastUpdated": "2021-06-08T10:00:00Z"}),
                json!({"id": "7", "lastUpdated": "2021-06-01T00:00:00Z"}),
            ],
        )
        .await;

    let importer = importer(&server, store.clone()).await;
    let now = Utc.with_ymd_and_hms(2021, 6, 9, 3, 0, 0).unwrap();
    let report = tokio_test::assert_ok!(importer.import_services_at(now).await);

    list.assert();
    assert_eq!(report.mode, SyncMode::Incremental);
    assert_eq!(report.services_fetched, 3);
    assert_eq!(report.services_stored, 2);
    assert_eq!(report.channels_fetched, 3);
    assert_eq!(report.channels_stored, 2);
    assert_eq!(report.municipalities_stored, 2);

    assert_eq!(
        store.ops().await,
        vec![
            StoreOp::DeleteByIds {
                collection: Collection::Services,
                ids: strings(&["1", "2", "3"]),
            },
            StoreOp::DeleteByIds {
                collection: Collection::Channels,
                ids: strings(&["0011", "0012", "0013"]),
            },
            StoreOp::Insert {
                collection: Collection::Services,
                count: 2,
            },
            StoreOp::Insert {
                collection: Collection::Channels,
                count: 2,
            },
            StoreOp::DeleteAll {
                collection: Collection::Municipalities,
            },
            StoreOp::Insert {
                collection: Collection::Municipalities,
                count: 2,
            },
        ]
    );

    // 3 was fetched but filtered out, so its old copy is gone too
    let service_ids = store.ids(Collection::Services).await;
    assert_eq!(service_ids.len(), 3);
    assert!(service_ids.contains("1") && service_ids.contains("2") && service_ids.contains("7"));

    let channel_ids = store.ids(Collection::Channels).await;
    assert_eq!(channel_ids.len(), 2);
    assert!(channel_ids.contains("0011") && channel_ids.contains("0012"));
}

#[tokio::test]
async fn test_stored_documents_share_one_timestamp_per_round() {
    let server = MockServer::start();
    mock_code_lists(&server);
    mock_catalog_details(&server);
    server.mock(|when, then| {
        when.method(GET).path("/Service");
        then.status(200).json_body(service_list_page());
    });

    let store = MemoryStore::new();
    let importer = importer(&server, store.clone()).await;
    let now = Utc.with_ymd_and_hms(2021, 6, 9, 3, 0, 0).unwrap();
    importer.import_services_at(now).await.unwrap();

    let services = store.documents(Collection::Services).await;
    let stamps: Vec<&Value> = services.iter().map(|doc| &doc["lastUpdated"]).collect();
    assert_eq!(stamps.len(), 2);
    assert!(stamps[0].is_string());
    assert_eq!(stamps[0], stamps[1]);

    let kotihoiva = services.iter().find(|doc| doc["id"] == "2").unwrap();
    assert_eq!(kotihoiva["name"]["fi"], "Kotihoiva");
    assert_eq!(kotihoiva["channelIds"], json!(["0012"]));

    let municipalities = store.documents(Collection::Municipalities).await;
    assert_eq!(municipalities[0]["id"], "853");
    assert_eq!(municipalities[0]["name"]["sv"], "Åbo");
    assert_eq!(municipalities[1]["id"], "529");
}

#[tokio::test]
async fn test_full_run_on_first_of_month_clears_collections() {
    let server = MockServer::start();
    mock_code_lists(&server);
    mock_catalog_details(&server);
    let dated = server.mock(|when, then| {
        when.method(GET).path("/Service").query_param_exists("date");
        then.status(500);
    });
    let list = server.mock(|when, then| {
        when.method(GET).path("/Service");
        then.status(200).json_body(service_list_page());
    });

    let store = MemoryStore::new();
    store
        .seed(
            Collection::Services,
            vec![json!({"id": "7", "lastUpdated": "2021-06-30T00:00:00Z"})],
        )
        .await;

    let importer = importer(&server, store.clone()).await;
    let now = Utc.with_ymd_and_hms(2021, 7, 1, 3, 0, 0).unwrap();
    let report = importer.import_services_at(now).await.unwrap();

    dated.assert_hits(0);
    list.assert();
    assert_eq!(report.mode, SyncMode::Full);
    assert_eq!(report.services_deleted, 1);

    let ops = store.ops().await;
    assert_eq!(
        &ops[..2],
        &[
            StoreOp::DeleteAll {
                collection: Collection::Services
            },
            StoreOp::DeleteAll {
                collection: Collection::Channels
            },
        ]
    );
    assert!(!ops
        .iter()
        .any(|op| matches!(op, StoreOp::DeleteByIds { .. })));

    let service_ids = store.ids(Collection::Services).await;
    assert_eq!(service_ids.len(), 2);
    assert!(!service_ids.contains("7"));
}

#[tokio::test]
async fn test_failed_fetch_leaves_store_untouched() {
    let server = MockServer::start();
    mock_code_lists(&server);
    server.mock(|when, then| {
        when.method(GET).path("/Service");
        then.status(200).json_body(service_list_page());
    });
    server.mock(|when, then| {
        when.method(GET).path("/Service/serviceWithGD/list");
        then.status(200).json_body(service_details());
    });
    server.mock(|when, then| {
        when.method(GET).path("/ServiceChannel/area/Province/code/02");
        then.status(200)
            .json_body(json!({"pageCount": 1, "itemList": [{"id": "0013"}]}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/ServiceChannel/list");
        then.status(503);
    });

    let store = MemoryStore::new();
    store
        .seed(Collection::Services, vec![json!({"id": "1"})])
        .await;

    let importer = importer(&server, store.clone()).await;
    let now = Utc.with_ymd_and_hms(2021, 6, 9, 3, 0, 0).unwrap();
    let err = importer.import_services_at(now).await.unwrap_err();

    assert!(matches!(err, SyncError::UpstreamStatus { status: 503, .. }));
    assert!(store.ops().await.is_empty());
    assert_eq!(store.ids(Collection::Services).await.len(), 1);
}

#[tokio::test]
async fn test_nothing_changed_skips_deletes_and_inserts() {
    let server = MockServer::start();
    mock_code_lists(&server);
    server.mock(|when, then| {
        when.method(GET).path("/Service");
        then.status(200)
            .json_body(json!({"pageCount": 0, "itemList": []}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/ServiceChannel/area/Province/code/02");
        then.status(200)
            .json_body(json!({"pageCount": 0, "itemList": []}));
    });
    let details = server.mock(|when, then| {
        when.method(GET).path("/Service/serviceWithGD/list");
        then.status(200).json_body(json!([]));
    });

    let store = MemoryStore::new();
    store
        .seed(
            Collection::Services,
            vec![json!({"id": "1", "lastUpdated": "2021-06-08T10:00:00Z"})],
        )
        .await;

    let importer = importer(&server, store.clone()).await;
    let now = Utc.with_ymd_and_hms(2021, 6, 9, 3, 0, 0).unwrap();
    let report = importer.import_services_at(now).await.unwrap();

    details.assert_hits(0);
    assert_eq!(report.services_deleted, 0);
    assert_eq!(report.services_stored, 0);
    assert_eq!(
        store.ops().await,
        vec![
            StoreOp::DeleteAll {
                collection: Collection::Municipalities
            },
            StoreOp::Insert {
                collection: Collection::Municipalities,
                count: 2
            },
        ]
    );
    assert_eq!(store.ids(Collection::Services).await.len(), 1);
}

#[tokio::test]
async fn test_province_scope_lists_services_by_area() {
    let server = MockServer::start();
    mock_code_lists(&server);
    mock_catalog_details(&server);
    let by_province = server.mock(|when, then| {
        when.method(GET)
            .path("/Service/area/Province/code/02")
            .query_param("includeWholeCountry", "true");
        then.status(200).json_body(service_list_page());
    });

    let store = MemoryStore::new();
    let catalog = CatalogClient::with_base_url(server.base_url()).unwrap();
    let options = SyncOptions {
        service_scope: ServiceScope::Province,
        include_whole_country: true,
    };
    let importer = ServiceImporter::new(catalog, store.clone(), &region_spec(), options)
        .await
        .unwrap();

    let now = Utc.with_ymd_and_hms(2021, 6, 9, 3, 0, 0).unwrap();
    let report = importer.import_services_at(now).await.unwrap();

    by_province.assert();
    assert_eq!(report.services_stored, 2);
    assert_eq!(importer.region().province.code, "02");
}

#[tokio::test]
async fn test_municipality_scope_unions_lists_of_every_municipality() {
    let server = MockServer::start();
    mock_code_lists(&server);
    mock_catalog_details(&server);
    let turku = server.mock(|when, then| {
        when.method(GET)
            .path("/Service/area/Municipality/code/853")
            .query_param("includeWholeCountry", "false");
        then.status(200)
            .json_body(json!({"pageCount": 1, "itemList": [{"id": "1"}, {"id": "2"}]}));
    });
    let naantali = server.mock(|when, then| {
        when.method(GET)
            .path("/Service/area/Municipality/code/529")
            .query_param("includeWholeCountry", "false");
        then.status(200)
            .json_body(json!({"pageCount": 1, "itemList": [{"id": "2"}, {"id": "3"}]}));
    });
    let everything = server.mock(|when, then| {
        when.method(GET).path("/Service");
        then.status(200).json_body(service_list_page());
    });

    let store = MemoryStore::new();
    let catalog = CatalogClient::with_base_url(server.base_url()).unwrap();
    let options = SyncOptions {
        service_scope: ServiceScope::Municipalities,
        include_whole_country: false,
    };
    let importer = ServiceImporter::new(catalog, store.clone(), &region_spec(), options)
        .await
        .unwrap();

    let now = Utc.with_ymd_and_hms(2021, 6, 9, 3, 0, 0).unwrap();
    let report = importer.import_services_at(now).await.unwrap();

    turku.assert_hits(1);
    naantali.assert_hits(1);
    everything.assert_hits(0);
    assert_eq!(report.services_fetched, 3);
    assert_eq!(report.services_stored, 2);
    assert_eq!(
        store.ops().await[0],
        StoreOp::DeleteByIds {
            collection: Collection::Services,
            ids: strings(&["1", "2", "3"]),
        }
    );
}

#[tokio::test]
async fn test_unknown_province_fails_before_any_sync() {
    let server = MockServer::start();
    mock_code_lists(&server);

    let catalog = CatalogClient::with_base_url(server.base_url()).unwrap();
    let spec = RegionSpec {
        province_name: "Lappi".to_string(),
        ..region_spec()
    };
    let result = ServiceImporter::new(catalog, MemoryStore::new(), &spec, SyncOptions::default()).await;

    assert!(matches!(result, Err(SyncError::RegionNotFound { .. })));
}
