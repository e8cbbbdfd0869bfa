//! Cryptographic primitives for the handshake and session traffic.
//!
//! - Challenge proof: the client runs its 16-byte challenge through RSA with
//!   its private key (PKCS#1 v1.5 block type 1, no digest prefix). The server
//!   recovers it with the stored public key and compares.
//! - Session key: 16 random bytes, RSA PKCS#1 v1.5 encrypted under the
//!   client's public key.
//! - Session traffic: AES-128/ECB/PKCS#7 by default. ECB is deterministic
//!   (equal plaintexts give equal ciphertexts); `XChaCha20Poly1305` is the
//!   authenticated alternative and changes the wire format.

use crate::error::{constants, ProtocolError, Result};
use aes::Aes128;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use ecb::cipher::block_padding::Pkcs7;
use ecb::cipher::{BlockDecryptMut, BlockEncryptMut};
use rand_core::OsRng;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Length of the authentication challenge in bytes
pub const CHALLENGE_LEN: usize = 16;

/// Length of the raw session key in bytes
pub const SESSION_KEY_LEN: usize = 16;

/// AES block size, the ECB ciphertext granularity
const AES_BLOCK: usize = 16;

/// XChaCha20 nonce length
const XNONCE_LEN: usize = 24;

type Aes128EcbEnc = ecb::Encryptor<Aes128>;
type Aes128EcbDec = ecb::Decryptor<Aes128>;

/// Fill a fixed-size array from the operating system RNG
pub fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    getrandom::fill(&mut buf)
        .map_err(|_| ProtocolError::Custom(constants::ERR_RANDOM_FAILED.into()))?;
    Ok(buf)
}

/// Fresh authentication challenge
pub fn generate_challenge() -> Result<[u8; CHALLENGE_LEN]> {
    random_bytes::<CHALLENGE_LEN>()
}

/// Per-connection symmetric key, wiped on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; SESSION_KEY_LEN]);

impl SessionKey {
    pub fn generate() -> Result<Self> {
        Ok(Self(random_bytes::<SESSION_KEY_LEN>()?))
    }

    pub fn from_bytes(bytes: [u8; SESSION_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; SESSION_KEY_LEN] = bytes
            .try_into()
            .map_err(|_| ProtocolError::KeyMaterial(constants::ERR_BAD_SESSION_KEY.into()))?;
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// Client side: prove possession of the private key for `challenge`
pub fn sign_challenge(private_key: &RsaPrivateKey, challenge: &[u8]) -> Result<Vec<u8>> {
    Ok(private_key.sign(Pkcs1v15Sign::new_unprefixed(), challenge)?)
}

/// Server side: check that `response` recovers to `challenge` under `public_key`
pub fn verify_challenge(public_key: &RsaPublicKey, challenge: &[u8], response: &[u8]) -> Result<()> {
    public_key
        .verify(Pkcs1v15Sign::new_unprefixed(), challenge, response)
        .map_err(|_| ProtocolError::HandshakeError(constants::ERR_CHALLENGE_MISMATCH.into()))
}

/// Encrypt the session key under the client's public key
pub fn wrap_session_key(public_key: &RsaPublicKey, key: &SessionKey) -> Result<Vec<u8>> {
    public_key
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, key.as_bytes())
        .map_err(|_| ProtocolError::EncryptionFailure)
}

/// Recover the session key with the client's private key
pub fn unwrap_session_key(private_key: &RsaPrivateKey, wrapped: &[u8]) -> Result<SessionKey> {
    let raw = Zeroizing::new(
        private_key
            .decrypt(Pkcs1v15Encrypt, wrapped)
            .map_err(|_| ProtocolError::DecryptionFailure)?,
    );
    SessionKey::from_slice(&raw)
}

/// Symmetric cipher used for command and reply frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum CipherSuite {
    /// AES-128/ECB/PKCS#7, compatible with existing clients
    #[default]
    #[serde(rename = "aes128-ecb")]
    Aes128Ecb,
    /// XChaCha20-Poly1305 with a random 24-byte nonce prefix
    #[serde(rename = "xchacha20poly1305")]
    XChaCha20Poly1305,
}

impl FromStr for CipherSuite {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "aes128-ecb" => Ok(CipherSuite::Aes128Ecb),
            "xchacha20poly1305" => Ok(CipherSuite::XChaCha20Poly1305),
            other => Err(ProtocolError::ConfigError(format!("Unknown cipher suite: {other}"))),
        }
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherSuite::Aes128Ecb => f.write_str("aes128-ecb"),
            CipherSuite::XChaCha20Poly1305 => f.write_str("xchacha20poly1305"),
        }
    }
}

/// Keyed session cipher
pub enum SessionCipher {
    Aes128Ecb(Zeroizing<[u8; SESSION_KEY_LEN]>),
    XChaCha20Poly1305(Box<XChaCha20Poly1305>),
}

impl SessionCipher {
    pub fn new(suite: CipherSuite, key: &SessionKey) -> Self {
        match suite {
            CipherSuite::Aes128Ecb => SessionCipher::Aes128Ecb(Zeroizing::new(*key.as_bytes())),
            CipherSuite::XChaCha20Poly1305 => {
                let mut derived: [u8; 32] = Sha256::new()
                    .chain_update(b"scrabble-session-v1")
                    .chain_update(key.as_bytes())
                    .finalize()
                    .into();
                let cipher = XChaCha20Poly1305::new(&derived.into());
                derived.zeroize();
                SessionCipher::XChaCha20Poly1305(Box::new(cipher))
            }
        }
    }

    pub fn suite(&self) -> CipherSuite {
        match self {
            SessionCipher::Aes128Ecb(_) => CipherSuite::Aes128Ecb,
            SessionCipher::XChaCha20Poly1305(_) => CipherSuite::XChaCha20Poly1305,
        }
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        match self {
            SessionCipher::Aes128Ecb(key) => {
                let enc = <Aes128EcbEnc as ecb::cipher::KeyInit>::new_from_slice(&key[..])
                    .map_err(|_| ProtocolError::EncryptionFailure)?;
                Ok(enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
            }
            SessionCipher::XChaCha20Poly1305(cipher) => {
                let nonce = random_bytes::<XNONCE_LEN>()?;
                let ciphertext = cipher
                    .encrypt(XNonce::from_slice(&nonce), plaintext)
                    .map_err(|_| ProtocolError::EncryptionFailure)?;

                let mut payload = nonce.to_vec();
                payload.extend(ciphertext);
                Ok(payload)
            }
        }
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        match self {
            SessionCipher::Aes128Ecb(key) => {
                if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK != 0 {
                    return Err(ProtocolError::DecryptionFailure);
                }
                let dec = <Aes128EcbDec as ecb::cipher::KeyInit>::new_from_slice(&key[..])
                    .map_err(|_| ProtocolError::DecryptionFailure)?;
                dec.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                    .map_err(|_| ProtocolError::DecryptionFailure)
            }
            SessionCipher::XChaCha20Poly1305(cipher) => {
                if ciphertext.len() < XNONCE_LEN {
                    return Err(ProtocolError::DecryptionFailure);
                }
                let (nonce, body) = ciphertext.split_at(XNONCE_LEN);
                cipher
                    .decrypt(XNonce::from_slice(nonce), body)
                    .map_err(|_| ProtocolError::DecryptionFailure)
            }
        }
    }
}

impl fmt::Debug for SessionCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionCipher").field(&self.suite()).finish()
    }
}
