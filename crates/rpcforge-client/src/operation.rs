//! The `Operation` trait: the seam between a typed request/response pair
//! and the document-centric runtime that actually signs, sends, and
//! retries it.
//!
//! Generated client crates implement one `Operation` per service
//! operation; [`Client::call`](crate::Client::call) is generic over it.

use std::collections::BTreeMap;

use rpcforge_error::ErrorKind;
use rpcforge_identity::AuthSchemeOption;
use rpcforge_runtime::ErrorRetryInfo;
use rpcforge_schema::{ResolvedSchema, ShapeId};
use rpcforge_serde::Document;

/// A single named request/response pair in a service.
///
/// `Input`/`Output`/`Error` are the generated, strongly-typed shapes;
/// [`encode_input`](Operation::encode_input) and
/// [`decode_output`](Operation::decode_output) cross the boundary to and
/// from the [`Document`] representation the runtime operates on.
pub trait Operation: Send + Sync + 'static {
    /// The operation's typed input.
    type Input: Send + Sync + 'static;
    /// The operation's typed output.
    type Output: Send + Sync + 'static;
    /// The operation's modeled error union, if it has one.
    type Error: Send + Sync + 'static;

    /// A stable, human-readable name used in logs, metrics, and errors.
    /// Not necessarily the shape's fully-qualified identifier.
    fn operation_id() -> &'static str;

    /// The operation shape's identifier in the schema registry.
    fn shape_id() -> ShapeId;
    /// The input structure shape's identifier.
    fn input_shape_id() -> ShapeId;
    /// The output structure shape's identifier.
    fn output_shape_id() -> ShapeId;

    /// Auth scheme candidates to try, in preference order.
    fn auth_options() -> Vec<AuthSchemeOption>;

    /// Header carrying the error discriminator code, if the protocol puts
    /// it in a header rather than (or in addition to) the body.
    fn error_discriminator_header() -> Option<&'static str> {
        None
    }

    /// Retry classification for each modeled error this operation can
    /// return, keyed by discriminator code.
    fn error_retry_info() -> BTreeMap<String, ErrorRetryInfo> {
        BTreeMap::new()
    }

    /// Project the typed input onto the operation's input schema.
    fn encode_input(input: &Self::Input, schema: ResolvedSchema<'_>) -> Document;

    /// Lift a successful response document back into the typed output,
    /// given its schema.
    fn decode_output(output: Document, schema: ResolvedSchema<'_>) -> Result<Self::Output, ErrorKind>;

    /// Lift a modeled-error discriminator and message into the
    /// operation's typed error union. Called only once the runtime has
    /// already decided the call failed with a recognized error shape.
    fn decode_error(code: &str, message: &str) -> Self::Error;
}
