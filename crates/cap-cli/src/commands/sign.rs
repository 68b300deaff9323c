//! Sign and verify-signature command implementations.

use crate::error::CheckFailed;
use crate::output;
use cap_canonical::Canonicalizer;
use cap_core::SignatureVerdict;
use cap_store::{sign_stored, verify_stored, FsRecordStore};
use std::path::PathBuf;

pub fn run(input: PathBuf, out: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = FsRecordStore::new();
    let signed = sign_stored(&mut store, &input, out.as_deref(), &Canonicalizer::v1())?;

    let signature = signed["validator_signatures"]["ethics_signature"]
        .as_str()
        .unwrap_or("?");
    let target = out.as_ref().unwrap_or(&input);
    println!("{}", signature);
    eprintln!("Signed {} -> {}", input.display(), target.display());
    Ok(())
}

pub fn verify(input: PathBuf, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = FsRecordStore::new();
    let verdict = verify_stored(&store, &input, &Canonicalizer::v1())?;

    if json {
        output::print_json(&verdict)?;
    } else {
        match &verdict {
            SignatureVerdict::Valid => println!("VALID {}", input.display()),
            SignatureVerdict::Invalid { expected, actual } => {
                println!("INVALID {}", input.display());
                println!("  expected: {}", expected);
                println!("  actual:   {}", actual);
            }
            SignatureVerdict::Missing => println!("MISSING {}", input.display()),
        }
    }

    match verdict {
        SignatureVerdict::Valid => Ok(()),
        SignatureVerdict::Invalid { .. } => Err(CheckFailed::Signature("is invalid").into()),
        SignatureVerdict::Missing => Err(CheckFailed::Signature("is missing").into()),
    }
}
