//! End-to-end exercise of `Client::call`: encode a typed input, sign it,
//! send it through a scripted transport, and decode a typed output —
//! without a live service anywhere in the loop.

use std::collections::BTreeMap;

use bytes::Bytes;
use rpcforge_client::{CallConfigOverrides, Client, Operation};
use rpcforge_endpoint::{Endpoint, StaticEndpointResolver};
use rpcforge_error::ErrorKind;
use rpcforge_identity::{
    AuthScheme, AuthSchemeOption, AwsCredentials, Identity, SignerKind, StaticIdentityResolver,
};
use rpcforge_runtime::ErrorRetryInfo;
use rpcforge_schema::{ResolvedSchema, ShapeId};
use rpcforge_serde::Document;
use rpcforge_testkit::{echo_operation_schemas, ScriptedResponse, ScriptedTransport};

struct EchoInput {
    id: String,
    tag: Option<String>,
}

#[derive(Debug)]
struct EchoOutput {
    result: String,
}

#[derive(Debug)]
struct EchoError {
    message: String,
}

struct EchoOperation;

impl Operation for EchoOperation {
    type Input = EchoInput;
    type Output = EchoOutput;
    type Error = EchoError;

    fn operation_id() -> &'static str {
        "EchoOperation"
    }

    fn shape_id() -> ShapeId {
        echo_operation_schemas().1.operation
    }

    fn input_shape_id() -> ShapeId {
        echo_operation_schemas().1.input
    }

    fn output_shape_id() -> ShapeId {
        echo_operation_schemas().1.output
    }

    fn auth_options() -> Vec<AuthSchemeOption> {
        vec![AuthSchemeOption { scheme_id: "aws.auth#sigv4".to_string(), ..Default::default() }]
    }

    fn error_retry_info() -> BTreeMap<String, ErrorRetryInfo> {
        BTreeMap::from([("ThrottlingException".to_string(), ErrorRetryInfo { retryable: true, throttling: true })])
    }

    fn encode_input(input: &Self::Input, _schema: ResolvedSchema<'_>) -> Document {
        let mut map = BTreeMap::new();
        map.insert("id".to_string(), Document::String(input.id.clone()));
        if let Some(tag) = &input.tag {
            map.insert("tag".to_string(), Document::String(tag.clone()));
        }
        Document::Map(map)
    }

    fn decode_output(output: Document, _schema: ResolvedSchema<'_>) -> Result<Self::Output, ErrorKind> {
        let result = output
            .get("result")
            .and_then(Document::as_str)
            .ok_or_else(|| ErrorKind::Serialization { shape_id: "testkit.fixture#EchoOutput".to_string(), message: "missing result".to_string() })?
            .to_string();
        Ok(EchoOutput { result })
    }

    fn decode_error(_code: &str, message: &str) -> Self::Error {
        EchoError { message: message.to_string() }
    }
}

fn test_client(transport: ScriptedTransport) -> Client {
    let (registry, _ids) = echo_operation_schemas();
    let schemas = rpcforge_schema::SchemaIndex::union(vec![std::sync::Arc::new(registry)]).0;

    let identity = Identity::AwsCredentials(AwsCredentials {
        access_key_id: "AKIDEXAMPLE".to_string(),
        secret_access_key: "secret".to_string(),
        session_token: None,
        expiration: None,
    });

    Client::builder(schemas)
        .endpoint_resolver(StaticEndpointResolver::new(Endpoint::new("https://example.test".parse().unwrap())))
        .auth_scheme(AuthScheme {
            scheme_id: "aws.auth#sigv4".to_string(),
            request_type: "http".to_string(),
            identity_type: "aws.credentials".to_string(),
            signer: SignerKind::SigV4,
        })
        .identity_resolver(StaticIdentityResolver::new(identity))
        .region("us-east-1")
        .transport(transport)
        .build()
        .expect("client builds with an endpoint resolver configured")
}

#[tokio::test]
async fn call_encodes_signs_sends_and_decodes() {
    let response = http::Response::builder()
        .status(200)
        .header("content-type", "application/json")
        .body(Bytes::from_static(br#"{"result":"ok"}"#))
        .unwrap();
    let transport = ScriptedTransport::once(response);
    let client = test_client(transport);

    let output = client
        .call::<EchoOperation>(EchoInput { id: "42".to_string(), tag: Some("blue".to_string()) }, None)
        .await
        .expect("scripted call succeeds");

    assert_eq!(output.result, "ok");
}

#[tokio::test]
async fn call_surfaces_a_modeled_error() {
    let response = http::Response::builder()
        .status(400)
        .header("content-type", "application/json")
        .body(Bytes::from_static(br#"{"__type":"ValidationException","message":"id is required"}"#))
        .unwrap();
    let transport = ScriptedTransport::once(response);
    let client = test_client(transport);

    let error = client
        .call::<EchoOperation>(EchoInput { id: "42".to_string(), tag: None }, Some(CallConfigOverrides::default()))
        .await
        .expect_err("a 400 with a discriminator is a modeled error, not a success");

    let modeled = error.as_modeled().expect("modeled error payload decoded");
    assert_eq!(modeled.message, "id is required");
}
