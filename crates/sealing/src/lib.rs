//! Hybrid file sealing.
//!
//! A sealed object is two sibling files sharing a base path `P`:
//!
//! ```text
//! P.sealed   AES-256-CBC ciphertext (PKCS#7 padded), no framing
//! P.env      16-byte IV || RSA PKCS#1 v1.5 wrapped AES key
//! ```
//!
//! The wrapped key has no length prefix; it is simply the rest of `P.env`
//! and is as long as the recipient's RSA modulus. There is no version tag and
//! no integrity checksum, so the layout must not change without versioning it.
//!
//! Each object is sealed to exactly one recipient public key.

pub mod artifacts;
pub mod cipher;
pub mod envelope;
pub mod keys;
pub mod sealer;
pub mod unsealer;

pub use artifacts::{read_sealed, write_sealed, SealedPaths};
pub use envelope::{Envelope, IV_LEN};
pub use keys::{normalize_private_key, PrivateKeyMaterial, PublicKeyMaterial};
pub use sealer::{seal, seal_file, SealOptions, SealOutcome, SealedObject};
pub use unsealer::unseal;
