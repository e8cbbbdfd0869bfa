//! Challenge-response handshake.
//!
//! ```text
//! client                                server
//!   | -- username (2-byte length utf) --> |  AwaitUsername
//!   | <------- 16-byte challenge -------- |  ChallengeSent -> AwaitResponse
//!   | --- challenge under private key --> |
//!   | <--- session key under public key - |  Authenticated
//! ```
//!
//! Both halves are plain state machines with no I/O so they can be driven by
//! any transport. State lives in a per-connection value; nothing is shared
//! between concurrent handshakes.
//!
//! An unknown user or a wrong challenge response moves the server to
//! `Rejected` and every later step fails. The caller is expected to close the
//! connection without replying.

use crate::auth::{UserRecord, UserRegistry};
use crate::error::{constants, ProtocolError, Result};
use crate::utils::crypto::{
    generate_challenge, sign_challenge, unwrap_session_key, verify_challenge, wrap_session_key,
    SessionKey, CHALLENGE_LEN,
};
use rsa::RsaPrivateKey;
use std::fmt;
use tracing::{debug, instrument, warn};
use zeroize::Zeroize;

/// Server-side handshake progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    AwaitUsername,
    ChallengeSent,
    AwaitResponse,
    Authenticated,
    Rejected,
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandshakeState::AwaitUsername => "await-username",
            HandshakeState::ChallengeSent => "challenge-sent",
            HandshakeState::AwaitResponse => "await-response",
            HandshakeState::Authenticated => "authenticated",
            HandshakeState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Server-side handshake state - passed through the handshake flow
pub struct ServerHandshake<'a> {
    registry: &'a UserRegistry,
    state: HandshakeState,
    user: Option<&'a UserRecord>,
    challenge: Option<[u8; CHALLENGE_LEN]>,
}

impl<'a> ServerHandshake<'a> {
    pub fn new(registry: &'a UserRegistry) -> Self {
        Self {
            registry,
            state: HandshakeState::AwaitUsername,
            user: None,
            challenge: None,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Name of the matched user, once the username step has succeeded
    pub fn username(&self) -> Option<&'a str> {
        self.user.map(|user| user.name.as_str())
    }

    /// Look up `username` and produce the challenge to send in the clear.
    ///
    /// # Errors
    /// `HandshakeError` for an unknown user; the handshake is then rejected.
    #[instrument(skip(self))]
    pub fn receive_username(&mut self, username: &str) -> Result<[u8; CHALLENGE_LEN]> {
        self.expect(HandshakeState::AwaitUsername)?;

        let Some(user) = self.registry.find(username) else {
            warn!("Unknown user, abandoning handshake");
            return Err(self.reject(constants::ERR_UNKNOWN_USER));
        };

        let challenge = generate_challenge().inspect_err(|_| {
            self.state = HandshakeState::Rejected;
        })?;

        self.user = Some(user);
        self.challenge = Some(challenge);
        self.state = HandshakeState::ChallengeSent;
        debug!("Issued challenge");
        Ok(challenge)
    }

    /// The challenge frame has been written; start waiting for the response
    pub fn challenge_sent(&mut self) -> Result<()> {
        self.expect(HandshakeState::ChallengeSent)?;
        self.state = HandshakeState::AwaitResponse;
        Ok(())
    }

    /// Check the client's proof and mint the session key.
    ///
    /// # Returns
    /// The session key and its encryption under the user's public key
    ///
    /// # Errors
    /// `HandshakeError` on a challenge mismatch; crypto errors if key wrapping
    /// fails. Either way the handshake is rejected.
    #[instrument(skip(self, response), fields(username = self.username().unwrap_or_default()))]
    pub fn receive_response(&mut self, response: &[u8]) -> Result<(SessionKey, Vec<u8>)> {
        self.expect(HandshakeState::AwaitResponse)?;

        let (Some(user), Some(mut challenge)) = (self.user, self.challenge.take()) else {
            return Err(self.reject(constants::ERR_OUT_OF_ORDER));
        };

        let verified = verify_challenge(&user.public_key, &challenge, response);
        challenge.zeroize();
        if let Err(e) = verified {
            warn!("Challenge response mismatch");
            self.state = HandshakeState::Rejected;
            return Err(e);
        }

        let minted = SessionKey::generate().and_then(|key| {
            let wrapped = wrap_session_key(&user.public_key, &key)?;
            Ok((key, wrapped))
        });
        match minted {
            Ok(pair) => {
                self.state = HandshakeState::Authenticated;
                debug!("Client authenticated");
                Ok(pair)
            }
            Err(e) => {
                self.state = HandshakeState::Rejected;
                Err(e)
            }
        }
    }

    fn expect(&self, expected: HandshakeState) -> Result<()> {
        match self.state {
            HandshakeState::Rejected => Err(ProtocolError::HandshakeError(
                constants::ERR_ALREADY_REJECTED.into(),
            )),
            state if state == expected => Ok(()),
            _ => Err(ProtocolError::HandshakeError(
                constants::ERR_OUT_OF_ORDER.into(),
            )),
        }
    }

    fn reject(&mut self, reason: &str) -> ProtocolError {
        self.state = HandshakeState::Rejected;
        ProtocolError::HandshakeError(reason.into())
    }
}

impl fmt::Debug for ServerHandshake<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerHandshake")
            .field("state", &self.state)
            .field("username", &self.username())
            .finish_non_exhaustive()
    }
}

/// Client-side handshake: answers the challenge and unwraps the session key
pub struct ClientHandshake<'a> {
    username: String,
    private_key: &'a RsaPrivateKey,
}

impl<'a> ClientHandshake<'a> {
    pub fn new(username: impl Into<String>, private_key: &'a RsaPrivateKey) -> Self {
        Self {
            username: username.into(),
            private_key,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Run the challenge through RSA with the private key
    pub fn answer_challenge(&self, challenge: &[u8]) -> Result<Vec<u8>> {
        sign_challenge(self.private_key, challenge)
    }

    /// Decrypt the session key sent after a successful proof
    pub fn accept_session_key(&self, wrapped: &[u8]) -> Result<SessionKey> {
        unwrap_session_key(self.private_key, wrapped)
    }
}

impl fmt::Debug for ClientHandshake<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandshake")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
