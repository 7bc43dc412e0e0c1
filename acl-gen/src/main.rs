use std::{fs, path::PathBuf};

use clap::Parser;
use ed25519_dalek::{SigningKey, pkcs8::DecodePrivateKey};
use uuid::Uuid;

use object_acl::api::v1::dto::AccessCheckRequest;
use object_acl::services::acl::{
    BearerToken, ContainerId, Lifetime, ObjectId, Operation, RequestVerificationHeader,
    SessionToken, UserId,
    token::{BearerBody, SessionBody, SessionContext},
};

/// Build a signed access-check request body for
/// `POST /api/v1/containers/{container_id}/access`.
///
/// - The request body is signed with `--private-pem` (innermost body signature)
/// - `--hop-pem` wraps the header once more, as a forwarding node would
/// - `--session-issuer-pem` attaches a session token delegating the operation
///   to the request signer
/// - `--bearer-pem` attaches a bearer token issued for the container
///
/// The JSON goes to stdout; derived user ids go to stderr.
#[derive(Parser, Debug)]
#[command(name = "acl-gen", version, about)]
struct Args {
    /// Path to the request signer's Ed25519 private key in PEM (PKCS#8)
    #[arg(long, value_name = "FILE")]
    private_pem: PathBuf,

    /// Operation: get, head, put, delete, search, range, range_hash
    #[arg(long, default_value = "get")]
    operation: Operation,

    /// Container id (hex). Only used for session/bearer tokens.
    #[arg(long)]
    container: ContainerId,

    /// Object id (hex)
    #[arg(long)]
    object: Option<ObjectId>,

    /// Request body bytes (UTF-8) to sign
    #[arg(long, default_value = "payload")]
    body: String,

    /// Key of a forwarding node that re-signs the request
    #[arg(long, value_name = "FILE")]
    hop_pem: Option<PathBuf>,

    /// Key of the session token issuer
    #[arg(long, value_name = "FILE")]
    session_issuer_pem: Option<PathBuf>,

    /// Key of the bearer token issuer (normally the container owner)
    #[arg(long, value_name = "FILE")]
    bearer_pem: Option<PathBuf>,

    /// Last epoch the attached tokens are valid in
    #[arg(long, default_value_t = u64::MAX)]
    exp: u64,

    /// Pretty-print the JSON
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn load_key(path: &PathBuf) -> Result<SigningKey, Box<dyn std::error::Error>> {
    let pem = fs::read_to_string(path)?;
    Ok(SigningKey::from_pkcs8_pem(&pem)?)
}

fn user_id(key: &SigningKey) -> Result<UserId, Box<dyn std::error::Error>> {
    Ok(UserId::from_public_key(key.verifying_key().as_bytes())?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let signer = load_key(&args.private_pem)?;
    let body = args.body.into_bytes();
    let lifetime = Lifetime {
        iat: 0,
        nbf: 0,
        exp: args.exp,
    };

    let mut header = RequestVerificationHeader::signed(&signer, &body);
    if let Some(path) = &args.hop_pem {
        let hop = load_key(path)?;
        eprintln!("hop: {}", user_id(&hop)?);
        header = header.forward(&hop, b"meta");
    }

    let session_token = match &args.session_issuer_pem {
        Some(path) => {
            let issuer = load_key(path)?;
            let mut token = SessionToken::new(SessionBody {
                id: Uuid::new_v4(),
                issuer: user_id(&issuer)?,
                lifetime,
                session_key: signer.verifying_key().to_bytes().to_vec(),
                context: SessionContext {
                    verb: args.operation,
                    container: args.container,
                    objects: args.object.into_iter().collect(),
                },
            });
            token.sign(&issuer);
            eprintln!("session issuer: {}", token.issuer());
            Some(token)
        }
        None => None,
    };

    let bearer_token = match &args.bearer_pem {
        Some(path) => {
            let issuer = load_key(path)?;
            let mut token = BearerToken::new(BearerBody {
                issuer: user_id(&issuer)?,
                container: Some(args.container),
                assert_user: None,
                lifetime,
            });
            token.sign(&issuer);
            eprintln!("bearer issuer: {}", token.body.issuer);
            Some(token)
        }
        None => None,
    };

    eprintln!("request signer: {}", user_id(&signer)?);

    let request = AccessCheckRequest {
        operation: args.operation,
        object_id: args.object,
        body,
        verification_header: Some(header),
        session_token,
        bearer_token,
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&request)?
    } else {
        serde_json::to_string(&request)?
    };
    println!("{json}");

    Ok(())
}
