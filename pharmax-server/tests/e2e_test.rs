//! End-to-end integration test
//!
//! Tests the full REST flow for every entity:
//! POST (create) -> GET (list/lookup) -> DELETE, plus health and stats.

use pharmax_server::{build_router, config::ServerConfig, AppState};
use pharmax_store::DocumentStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

/// Start a test server on a random port, returns (base_url, _temp_dir)
async fn start_test_server() -> (String, TempDir) {
    let temp_dir = TempDir::new().unwrap();

    let store = DocumentStore::open(temp_dir.path().join("pharmax.sqlite")).unwrap();

    let state = Arc::new(AppState {
        store,
        config: ServerConfig::default(),
    });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), temp_dir)
}

async fn post(client: &reqwest::Client, url: String, body: Value) -> reqwest::Response {
    client.post(url).json(&body).send().await.unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (base_url, _dir) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/health", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "OK");
    assert_eq!(body["database"], "connected");
    assert!(body["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn test_patient_create_normalizes_and_lists_once() {
    let (base_url, _dir) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = post(
        &client,
        format!("{}/api/patients", base_url),
        json!({
            "firstName": "  Jane ",
            "lastName": " Doe ",
            "email": " Jane.Doe@Example.COM "
        }),
    )
    .await;
    assert_eq!(resp.status(), 201, "POST should return 201 Created");

    let created: Value = resp.json().await.unwrap();
    let patient = &created["patient"];
    let id = patient["id"].as_str().expect("created patient should have id");
    assert_eq!(patient["firstName"], "Jane");
    assert_eq!(patient["lastName"], "Doe");
    assert_eq!(patient["email"], "jane.doe@example.com");
    assert!(patient["createdAt"].as_str().is_some());

    // List includes the patient exactly once, fields unchanged.
    let resp = client
        .get(format!("{}/api/patients", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["count"], 1);
    let patients = body["patients"].as_array().unwrap();
    let matches: Vec<_> = patients
        .iter()
        .filter(|p| p["id"].as_str() == Some(id))
        .collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["email"], "jane.doe@example.com");

    // Lookup by id round-trips the same record.
    let resp = client
        .get(format!("{}/api/patients/{}", base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["patient"]["firstName"], "Jane");
}

#[tokio::test]
async fn test_duplicate_email_rejected_case_insensitive() {
    let (base_url, _dir) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = post(
        &client,
        format!("{}/api/patients", base_url),
        json!({"firstName": "Jane", "lastName": "Doe", "email": "jane@example.com"}),
    )
    .await;
    assert_eq!(resp.status(), 201);

    let resp = post(
        &client,
        format!("{}/api/patients", base_url),
        json!({"firstName": "John", "lastName": "Doe", "email": "JANE@EXAMPLE.COM"}),
    )
    .await;
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Email already exists");

    // Only the first patient exists.
    let body: Value = client
        .get(format!("{}/api/patients", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_patient_validation_rejected() {
    let (base_url, _dir) = start_test_server().await;
    let client = reqwest::Client::new();

    for (body, message) in [
        (json!({"lastName": "Doe", "email": "a@b.com"}), "First name is required"),
        (
            json!({"firstName": "J", "lastName": "Doe", "email": "a@b.com"}),
            "First name must be at least 2 characters",
        ),
        (
            json!({"firstName": "Jane", "lastName": "Doe", "email": "nope"}),
            "Invalid email format",
        ),
    ] {
        let resp = post(&client, format!("{}/api/patients", base_url), body).await;
        assert_eq!(resp.status(), 400);
        let err: Value = resp.json().await.unwrap();
        assert_eq!(err["error"], message);
    }
}

#[tokio::test]
async fn test_patient_not_found() {
    let (base_url, _dir) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/patients/nonexistent-id", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Patient not found");
}

#[tokio::test]
async fn test_malady_blank_name_creates_nothing() {
    let (base_url, _dir) = start_test_server().await;
    let client = reqwest::Client::new();

    for body in [json!({}), json!({"maladyName": ""}), json!({"maladyName": "   "})] {
        let resp = post(&client, format!("{}/api/maladies", base_url), body).await;
        assert_eq!(resp.status(), 400);
        let err: Value = resp.json().await.unwrap();
        assert_eq!(err["error"], "Malady name is required");
    }

    let body: Value = client
        .get(format!("{}/api/maladies", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_malady_duplicate_name_rejected() {
    let (base_url, _dir) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = post(
        &client,
        format!("{}/api/maladies", base_url),
        json!({"maladyName": "Flu"}),
    )
    .await;
    assert_eq!(resp.status(), 201);

    let resp = post(
        &client,
        format!("{}/api/maladies", base_url),
        json!({"maladyName": "  Flu  "}),
    )
    .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Malady already exists");
}

#[tokio::test]
async fn test_malady_delete_cascades_to_medicaments() {
    let (base_url, _dir) = start_test_server().await;
    let client = reqwest::Client::new();

    let malady: Value = post(
        &client,
        format!("{}/api/maladies", base_url),
        json!({"maladyName": "Flu"}),
    )
    .await
    .json()
    .await
    .unwrap();
    let malady_id = malady["malady"]["id"].as_str().unwrap().to_string();

    let other: Value = post(
        &client,
        format!("{}/api/maladies", base_url),
        json!({"maladyName": "Cold"}),
    )
    .await
    .json()
    .await
    .unwrap();
    let other_id = other["malady"]["id"].as_str().unwrap().to_string();

    for name in ["Aspirin", "Paracetamol", "Oseltamivir"] {
        let resp = post(
            &client,
            format!("{}/api/medicaments", base_url),
            json!({"medicamentName": name, "maladyId": malady_id}),
        )
        .await;
        assert_eq!(resp.status(), 201);
    }
    let resp = post(
        &client,
        format!("{}/api/medicaments", base_url),
        json!({"medicamentName": "Lozenge", "maladyId": other_id}),
    )
    .await;
    assert_eq!(resp.status(), 201);

    // Delete the malady; its three medicaments go with it.
    let resp = client
        .delete(format!("{}/api/maladies/{}", base_url, malady_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("deleted"));

    let body: Value = client
        .get(format!("{}/api/medicaments/malady/{}", base_url, malady_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 0);

    // The unrelated medicament survives.
    let body: Value = client
        .get(format!("{}/api/medicaments", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["medicaments"][0]["medicamentName"], "Lozenge");

    // Deleting again is a 404.
    let resp = client
        .delete(format!("{}/api/maladies/{}", base_url, malady_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_medicament_list_resolves_malady() {
    let (base_url, _dir) = start_test_server().await;
    let client = reqwest::Client::new();

    let malady: Value = post(
        &client,
        format!("{}/api/maladies", base_url),
        json!({"maladyName": "Migraine"}),
    )
    .await
    .json()
    .await
    .unwrap();
    let malady_id = malady["malady"]["id"].as_str().unwrap().to_string();

    let resp = post(
        &client,
        format!("{}/api/medicaments", base_url),
        json!({"medicamentName": "Sumatriptan", "maladyId": malady_id}),
    )
    .await;
    assert_eq!(resp.status(), 201);

    let body: Value = client
        .get(format!("{}/api/medicaments", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let medicament = &body["medicaments"][0];
    assert_eq!(medicament["medicamentName"], "Sumatriptan");
    assert_eq!(medicament["malady"]["maladyName"], "Migraine");
    assert_eq!(medicament["malady"]["id"].as_str().unwrap(), malady_id);
}

#[tokio::test]
async fn test_medicament_missing_fields_rejected() {
    let (base_url, _dir) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = post(
        &client,
        format!("{}/api/medicaments", base_url),
        json!({"maladyId": "some-id"}),
    )
    .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Medicament name is required");

    let resp = post(
        &client,
        format!("{}/api/medicaments", base_url),
        json!({"medicamentName": "Aspirin"}),
    )
    .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Malady ID is required");
}

#[tokio::test]
async fn test_medicament_delete_not_found() {
    let (base_url, _dir) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .delete(format!("{}/api/medicaments/nope", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_consultation_full_flow() {
    let (base_url, _dir) = start_test_server().await;
    let client = reqwest::Client::new();

    let patient: Value = post(
        &client,
        format!("{}/api/patients", base_url),
        json!({"firstName": "Jane", "lastName": "Doe", "email": "jane@example.com"}),
    )
    .await
    .json()
    .await
    .unwrap();
    let patient_id = patient["patient"]["id"].as_str().unwrap().to_string();

    let malady: Value = post(
        &client,
        format!("{}/api/maladies", base_url),
        json!({"maladyName": "Flu"}),
    )
    .await
    .json()
    .await
    .unwrap();
    let malady_id = malady["malady"]["id"].as_str().unwrap().to_string();

    let medicament: Value = post(
        &client,
        format!("{}/api/medicaments", base_url),
        json!({"medicamentName": "Oseltamivir", "maladyId": malady_id}),
    )
    .await
    .json()
    .await
    .unwrap();
    let medicament_id = medicament["medicament"]["id"].as_str().unwrap().to_string();

    // Create with all three references; response is resolved.
    let resp = post(
        &client,
        format!("{}/api/consultations", base_url),
        json!({
            "patientId": patient_id,
            "maladyId": malady_id,
            "medicamentId": medicament_id,
            "notes": "rest and fluids"
        }),
    )
    .await;
    assert_eq!(resp.status(), 201);

    let created: Value = resp.json().await.unwrap();
    let consultation = &created["consultation"];
    let consultation_id = consultation["id"].as_str().unwrap().to_string();
    assert_eq!(consultation["patient"]["firstName"], "Jane");
    assert_eq!(consultation["patient"]["email"], "jane@example.com");
    assert_eq!(consultation["malady"]["maladyName"], "Flu");
    assert_eq!(consultation["medicament"]["medicamentName"], "Oseltamivir");
    assert_eq!(consultation["notes"], "rest and fluids");
    // Omitted date defaults to the creation instant.
    assert!(consultation["date"].as_str().is_some());

    // Filtered by patient.
    let body: Value = client
        .get(format!("{}/api/consultations/patient/{}", base_url, patient_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["consultations"][0]["id"].as_str().unwrap(), consultation_id);

    // Delete echoes the record.
    let resp = client
        .delete(format!("{}/api/consultations/{}", base_url, consultation_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Consultation deleted successfully");
    assert_eq!(body["consultation"]["id"].as_str().unwrap(), consultation_id);
    assert_eq!(body["consultation"]["isDeleted"], true);

    // Gone from the list afterwards.
    let body: Value = client
        .get(format!("{}/api/consultations", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 0);

    // And a second delete is a 404.
    let resp = client
        .delete(format!("{}/api/consultations/{}", base_url, consultation_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_consultation_missing_reference_rejected() {
    let (base_url, _dir) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = post(
        &client,
        format!("{}/api/consultations", base_url),
        json!({"maladyId": "m1", "medicamentId": "d1"}),
    )
    .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Patient ID is required");
}

#[tokio::test]
async fn test_consultation_dangling_reference_resolves_to_null() {
    let (base_url, _dir) = start_test_server().await;
    let client = reqwest::Client::new();

    // References are presence-checked only, so unknown ids are accepted.
    let resp = post(
        &client,
        format!("{}/api/consultations", base_url),
        json!({
            "patientId": "ghost-patient",
            "maladyId": "ghost-malady",
            "medicamentId": "ghost-medicament"
        }),
    )
    .await;
    assert_eq!(resp.status(), 201);

    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["consultation"]["patient"], Value::Null);
    assert_eq!(created["consultation"]["malady"], Value::Null);
    assert_eq!(created["consultation"]["medicament"], Value::Null);
}

#[tokio::test]
async fn test_stats_counts_live_records() {
    let (base_url, _dir) = start_test_server().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("{}/api/stats", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["patients"], 0);
    assert_eq!(body["consultations"], 0);

    post(
        &client,
        format!("{}/api/patients", base_url),
        json!({"firstName": "Jane", "lastName": "Doe", "email": "jane@example.com"}),
    )
    .await;
    let malady: Value = post(
        &client,
        format!("{}/api/maladies", base_url),
        json!({"maladyName": "Flu"}),
    )
    .await
    .json()
    .await
    .unwrap();
    let malady_id = malady["malady"]["id"].as_str().unwrap().to_string();

    let body: Value = client
        .get(format!("{}/api/stats", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["patients"], 1);
    assert_eq!(body["maladies"], 1);
    assert_eq!(body["medicaments"], 0);

    // Deleted records drop out of the counts.
    client
        .delete(format!("{}/api/maladies/{}", base_url, malady_id))
        .send()
        .await
        .unwrap();

    let body: Value = client
        .get(format!("{}/api/stats", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["maladies"], 0);
}

#[tokio::test]
async fn test_cors_preflight() {
    let (base_url, _dir) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .request(reqwest::Method::OPTIONS, format!("{}/api/patients", base_url))
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
}
