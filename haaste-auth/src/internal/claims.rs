use crate::internal::unixtime::{UnixTimestamp, SESSION_LIFETIME};
use crate::{UserId, Username};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

//--------------------------------------------------------------------------------------------------
// Claims written into a session token
//--------------------------------------------------------------------------------------------------

#[derive(Serialize, Debug)]
pub(crate) struct SessionClaims {
    username: Username,
    sub: UserId,
    exp: UnixTimestamp,
}

// Make sure we only assemble it here, so the expiry is always the session lifetime
impl SessionClaims {
    pub(crate) fn new(username: Username, sub: UserId, issued_at: UnixTimestamp) -> Self {
        SessionClaims {
            username,
            sub,
            exp: issued_at.add(SESSION_LIFETIME),
        }
    }

    pub(crate) fn exp(&self) -> UnixTimestamp {
        self.exp
    }
}

//--------------------------------------------------------------------------------------------------
// Claims read from a presented bearer token
//--------------------------------------------------------------------------------------------------

// Claims of the wrong JSON type are treated as absent rather than making the whole token malformed
#[derive(Debug)]
pub(crate) struct PresentedClaims {
    oid: Option<String>,
    exp: Option<UnixTimestamp>,
}

impl PresentedClaims {
    pub(crate) fn oid(&self) -> Option<&str> {
        self.oid.as_deref()
    }

    pub(crate) fn exp(&self) -> Option<UnixTimestamp> {
        self.exp
    }
}

impl<'de> Deserialize<'de> for PresentedClaims {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Go through a map so the payload has to be a JSON object, and a repeated key keeps its
        // last value
        let mut claims = Map::<String, Value>::deserialize(deserializer)?;

        Ok(PresentedClaims {
            oid: lenient(claims.remove("oid")),
            exp: lenient(claims.remove("exp")),
        })
    }
}

fn lenient<T: DeserializeOwned>(value: Option<Value>) -> Option<T> {
    value.and_then(|value| T::deserialize(value).ok())
}

//--------------------------------------------------------------------------------------------------


//--------------------------------------------------------------------------------------------------
