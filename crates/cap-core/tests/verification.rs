use cap_canonical::Canonicalizer;
use cap_core::{
    check_artifact, check_integrity, compute_ethics_signature, compute_signature,
    content_address, sign_record, verify_ethics_signature, verify_remote, verify_signature,
    ArtifactFetcher, CapRecord, FetchError, IntegrityVerdict, SignError, SignatureVerdict,
    WebhookDelivery, WebhookGate, WebhookSecret,
};
use serde_json::{json, Value};
use std::collections::HashMap;

fn make_record() -> Value {
    json!({
        "cap_id": "0192f0c4-7d1e-7a3b-9c2d-5e6f7a8b9c0d",
        "timestamp": "2025-10-01T12:00:00Z",
        "domain": "Research",
        "context_mode": "Advisor",
        "ems": 0.87,
        "cw": 0.14,
        "ad": 0.11,
        "hci": 0.81,
        "hs": 0.95,
        "body": {
            "test": "Athena CAP validation handshake",
            "description": "End-to-end integrity test"
        }
    })
}

fn canonicalizer() -> Canonicalizer {
    Canonicalizer::v1()
}

#[test]
fn signed_record_verifies() {
    let signed = sign_record(make_record(), &canonicalizer()).unwrap();
    let sig = signed["validator_signatures"]["ethics_signature"]
        .as_str()
        .unwrap();
    assert!(sig.starts_with("SHA256:"));
    assert_eq!(sig.len(), "SHA256:".len() + 64);
    assert!(sig["SHA256:".len()..]
        .chars()
        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));

    assert_eq!(
        verify_ethics_signature(&signed, &canonicalizer()).unwrap(),
        SignatureVerdict::Valid
    );
}

#[test]
fn signing_is_deterministic_with_existing_id() {
    let first = sign_record(make_record(), &canonicalizer()).unwrap();
    let second = sign_record(make_record(), &canonicalizer()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn mutating_body_invalidates_signature() {
    let mut signed = sign_record(make_record(), &canonicalizer()).unwrap();
    signed["body"]["test"] = json!("tampered");

    match verify_ethics_signature(&signed, &canonicalizer()).unwrap() {
        SignatureVerdict::Invalid { expected, actual } => assert_ne!(expected, actual),
        other => panic!("expected Invalid, got {:?}", other),
    }
}

#[test]
fn chain_and_ledger_fields_do_not_affect_signature() {
    let mut signed = sign_record(make_record(), &canonicalizer()).unwrap();
    signed["governance_chain"] = json!({
        "hash_prev": format!("SHA256:{}", "A".repeat(64)),
        "hash_next": format!("SHA256:{}", "0".repeat(64))
    });
    signed["ledger_hash"] = json!("e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
    assert!(verify_ethics_signature(&signed, &canonicalizer())
        .unwrap()
        .is_valid());
}

#[test]
fn other_validator_entries_are_kept_and_signed() {
    let mut record = make_record();
    record["validator_signatures"] = json!({"validator": "Athena-Audit-Core"});
    let signed = sign_record(record, &canonicalizer()).unwrap();
    assert_eq!(
        signed["validator_signatures"]["validator"],
        json!("Athena-Audit-Core")
    );

    let mut tampered = signed.clone();
    tampered["validator_signatures"]["validator"] = json!("someone-else");
    assert!(!verify_ethics_signature(&tampered, &canonicalizer())
        .unwrap()
        .is_valid());
}

#[test]
fn missing_cap_id_is_generated() {
    let mut record = make_record();
    record.as_object_mut().unwrap().remove("cap_id");
    let signed = sign_record(record, &canonicalizer()).unwrap();

    let typed = CapRecord::from_value(&signed).unwrap();
    let id = typed.cap_id.expect("cap_id assigned");
    assert_eq!(id.len(), 36);
    assert_eq!(&id[14..15], "7", "generated ids are UUIDv7");
    assert!(verify_ethics_signature(&signed, &canonicalizer())
        .unwrap()
        .is_valid());
}

#[test]
fn signed_record_is_normalized() {
    let mut record = make_record();
    record["domain"] = json!("  Research \n Lab ");
    record["ems"] = json!(0.123456789);
    let signed = sign_record(record, &canonicalizer()).unwrap();
    assert_eq!(signed["domain"], json!("Research Lab"));
    assert_eq!(signed["ems"], json!(0.123457));
}

#[test]
fn signature_excludes_itself() {
    let record = make_record();
    let before = compute_ethics_signature(&record, &canonicalizer()).unwrap();
    let signed = sign_record(record, &canonicalizer()).unwrap();
    let after = compute_ethics_signature(&signed, &canonicalizer()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn non_object_validator_entry_is_replaced_before_signing() {
    let mut record = make_record();
    record["validator_signatures"] = json!("pending");
    let signed = sign_record(record, &canonicalizer()).unwrap();

    let sigs = signed["validator_signatures"].as_object().unwrap();
    assert_eq!(sigs.len(), 1);
    assert!(sigs.contains_key("ethics_signature"));
    assert_eq!(
        verify_ethics_signature(&signed, &canonicalizer()).unwrap(),
        SignatureVerdict::Valid
    );
    let plain = sign_record(make_record(), &canonicalizer()).unwrap();
    assert_eq!(signed, plain);
}

#[test]
fn unsigned_record_reports_missing() {
    assert_eq!(
        verify_ethics_signature(&make_record(), &canonicalizer()).unwrap(),
        SignatureVerdict::Missing
    );
}

#[test]
fn non_object_is_malformed_source() {
    let err = sign_record(json!([1, 2, 3]), &canonicalizer()).unwrap_err();
    assert!(matches!(err, SignError::MalformedSource(_)));
}

#[test]
fn typed_view_exposes_metrics() {
    let typed = CapRecord::from_value(&make_record()).unwrap();
    let metrics: HashMap<&str, f64> = typed.metrics().collect();
    assert_eq!(metrics["ems"], 0.87);
    assert_eq!(metrics.len(), 5);
    assert!(typed.governance_chain.is_none());
}

#[test]
fn webhook_signature_round_trip() {
    let body = br#"{"cap_id":"c1"}"#;
    let sig = compute_signature(b"secret", body);
    assert!(sig.starts_with("sha256="));
    assert!(verify_signature(b"secret", body, Some(&sig)));
}

#[test]
fn webhook_rejects_wrong_length_without_panicking() {
    assert!(!verify_signature(b"secret", b"body", Some("sha256=abc")));
    assert!(!verify_signature(b"secret", b"body", Some("")));
    assert!(!verify_signature(b"secret", b"body", None));
}

#[test]
fn webhook_rejects_equal_length_wrong_content() {
    let body = b"payload";
    let good = compute_signature(b"secret", body);
    let mut bad = good.clone().into_bytes();
    let last = bad.len() - 1;
    bad[last] = if bad[last] == b'0' { b'1' } else { b'0' };
    let bad = String::from_utf8(bad).unwrap();
    assert_eq!(bad.len(), good.len());
    assert!(!verify_signature(b"secret", body, Some(&bad)));
    assert!(!verify_signature(b"other-secret", body, Some(&good)));
}

#[test]
fn webhook_gate_maps_responses() {
    let gate = WebhookGate::new(WebhookSecret::new("s3cret"), "/v3/cap/log");
    let body = br#"{"cap_id":"c9"}"#;
    let sig = compute_signature(b"s3cret", body);

    let wrong_route = gate.handle(&WebhookDelivery {
        method: "POST",
        path: "/other",
        signature: Some(&sig),
        body,
    });
    assert_eq!(wrong_route.status, 404);

    let wrong_method = gate.handle(&WebhookDelivery {
        method: "GET",
        path: "/v3/cap/log",
        signature: Some(&sig),
        body,
    });
    assert_eq!(wrong_method.status, 404);

    let missing = gate.handle(&WebhookDelivery {
        method: "POST",
        path: "/v3/cap/log",
        signature: None,
        body,
    });
    assert_eq!(missing.status, 401);
    assert_eq!(missing.body, json!({"error": "Missing signature"}));

    let empty = gate.handle(&WebhookDelivery {
        method: "POST",
        path: "/v3/cap/log",
        signature: Some(""),
        body,
    });
    assert_eq!(empty.status, 401);
    assert_eq!(empty.body, json!({"error": "Missing signature"}));

    let invalid = gate.handle(&WebhookDelivery {
        method: "POST",
        path: "/v3/cap/log",
        signature: Some("sha256=deadbeef"),
        body,
    });
    assert_eq!(invalid.status, 401);
    assert_eq!(invalid.body, json!({"error": "Invalid signature"}));

    let ok = gate.handle(&WebhookDelivery {
        method: "POST",
        path: "/v3/cap/log",
        signature: Some(&sig),
        body,
    });
    assert_eq!(ok.status, 200);
    assert_eq!(
        ok.body,
        json!({"status": "ok", "verified": true, "received": true, "body": {"cap_id": "c9"}})
    );
}

#[test]
fn webhook_gate_echoes_non_json_body() {
    let gate = WebhookGate::new(WebhookSecret::new("k"), "/v3/cap/log");
    let body = b"plain text";
    let sig = compute_signature(b"k", body);
    let ok = gate.handle(&WebhookDelivery {
        method: "POST",
        path: "/v3/cap/log",
        signature: Some(&sig),
        body,
    });
    assert_eq!(ok.status, 200);
    assert_eq!(ok.body["body"], json!({"raw": "plain text"}));
}

#[test]
fn ledger_match_and_mismatch() {
    let artifact = b"{\"cap_id\":\"c1\"}\n";
    let address = content_address(artifact);

    assert_eq!(
        check_integrity(artifact, Some(&address)),
        IntegrityVerdict::Match {
            address: address.clone()
        }
    );

    let tampered = b"{\"cap_id\":\"c2\"}\n";
    match check_integrity(tampered, Some(&address)) {
        IntegrityVerdict::Mismatch { expected, actual } => {
            assert_eq!(expected, address);
            assert_ne!(actual, address);
        }
        other => panic!("expected Mismatch, got {:?}", other),
    }
}

#[test]
fn ledger_without_stored_hash_is_skipped() {
    assert_eq!(check_integrity(b"anything", None), IntegrityVerdict::Skipped);
    assert_eq!(check_artifact(br#"{"cap_id":"c1"}"#), IntegrityVerdict::Skipped);
    assert_eq!(check_artifact(b"not json"), IntegrityVerdict::Skipped);
}

#[test]
fn ledger_hash_covers_bytes_not_semantics() {
    let compact = br#"{"a":1}"#;
    let spaced = br#"{ "a": 1 }"#;
    assert_ne!(content_address(compact), content_address(spaced));
}

struct StaticFetcher(HashMap<String, Vec<u8>>);

impl ArtifactFetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.0.get(url).cloned().ok_or_else(|| FetchError {
            url: url.to_string(),
            reason: "404".to_string(),
        })
    }
}

#[test]
fn remote_verification_uses_embedded_ledger_hash() {
    let artifact = br#"{"cap_id":"c1","ledger_hash":"0000000000000000000000000000000000000000"}"#;
    let fetcher = StaticFetcher(HashMap::from([(
        "https://ledger.example/c1.json".to_string(),
        artifact.to_vec(),
    )]));

    let verdict = verify_remote(&fetcher, "https://ledger.example/c1.json").unwrap();
    assert!(matches!(verdict, IntegrityVerdict::Mismatch { .. }));
    assert!(verify_remote(&fetcher, "https://ledger.example/missing.json").is_err());
}
