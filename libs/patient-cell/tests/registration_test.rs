use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::{PatientService, PatientStatus};
use shared_database::SupabaseClient;
use shared_models::ClinicError;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

const PHONE: &str = "5511988887777";

fn service_for(server: &MockServer) -> PatientService {
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    PatientService::with_client(Arc::new(SupabaseClient::new(&config)))
}

#[tokio::test]
async fn registers_new_patient_and_greets_by_first_name() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("phone", format!("eq.{}", PHONE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .and(body_partial_json(json!({
            "full_name": "Maria Clara Souza",
            "phone": PHONE,
            "date_of_birth": "1990-08-15"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::new_patient("Maria Clara Souza", PHONE)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let reply = service_for(&server)
        .register_patient(PHONE, "Maria Clara Souza", Some("15/08/1990"))
        .await
        .unwrap();

    assert!(reply.starts_with("Ótimo, Maria!"));
}

#[tokio::test]
async fn second_registration_reports_already_registered_without_inserting() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::new_patient("João Lima", PHONE)
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::new_patient("João Lima", PHONE)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    service.register_patient(PHONE, "João Lima", None).await.unwrap();

    let second = service.register_patient(PHONE, "João Lima", None).await;
    assert_matches!(second, Err(ClinicError::Conflict(ref msg)) if msg == "Você já possui um cadastro conosco.");
}

#[tokio::test]
async fn unique_violation_on_insert_is_treated_as_already_registered() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"patients_phone_key\""
        })))
        .mount(&server)
        .await;

    let result = service_for(&server).register_patient(PHONE, "Ana", None).await;
    assert_matches!(result, Err(ClinicError::Conflict(_)));
}

#[tokio::test]
async fn malformed_date_of_birth_is_a_validation_error_and_nothing_is_written() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let result = service_for(&server)
        .register_patient(PHONE, "Carlos Alberto", Some("agosto de 1990"))
        .await;

    assert_matches!(result, Err(ClinicError::Validation(_)));
}

#[tokio::test]
async fn status_reflects_directory_contents() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("phone", "eq.5511000000000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("phone", format!("eq.{}", PHONE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::new_patient("Beatriz Costa", PHONE)
        ])))
        .mount(&server)
        .await;

    let service = service_for(&server);
    assert_eq!(
        service.status(PHONE).await.unwrap(),
        PatientStatus::Found { full_name: "Beatriz Costa".to_string() }
    );
    assert_eq!(service.status("5511000000000").await.unwrap(), PatientStatus::NotRegistered);
}
