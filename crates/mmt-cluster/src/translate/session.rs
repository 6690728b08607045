use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use super::TRANSLATE_TARGET;
use super::context::ContextSource;
use super::errors::TranslateError;
use crate::api::{Translation, TranslationApi, TranslationOptions};

/// Translation state shared by every line of one command.
///
/// With a context source, a node session is opened on the first translation
/// and closed when the value is dropped. Close failures are ignored.
pub struct TranslationSession<'a> {
    api: &'a dyn TranslationApi,
    context: Option<ContextSource>,
    nbest: Option<u32>,
    session: Mutex<Option<u64>>,
}

impl<'a> TranslationSession<'a> {
    /// Creates a session; nothing is sent to the node yet.
    #[must_use]
    pub const fn new(
        api: &'a dyn TranslationApi,
        context: Option<ContextSource>,
        nbest: Option<u32>,
    ) -> Self {
        Self {
            api,
            context,
            nbest,
            session: Mutex::new(None),
        }
    }

    /// Number of hypotheses requested per line.
    #[must_use]
    pub const fn nbest(&self) -> Option<u32> {
        self.nbest
    }

    /// Node session id, opening the session when first needed.
    pub fn id(&self) -> Result<Option<u64>, TranslateError> {
        let Some(context) = &self.context else {
            return Ok(None);
        };
        let mut slot = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = *slot {
            return Ok(Some(id));
        }
        let weights = context.resolve(self.api)?;
        let session = self.api.create_session(&weights)?;
        info!(target: TRANSLATE_TARGET, session = session.id, "opened translation session");
        *slot = Some(session.id);
        Ok(Some(session.id))
    }

    /// Translates one line within the session.
    pub fn translate(&self, line: &str) -> Result<Translation, TranslateError> {
        let options = TranslationOptions {
            session: self.id()?,
            nbest: self.nbest,
            context: None,
        };
        Ok(self.api.translate(line, &options)?)
    }
}

impl Drop for TranslationSession<'_> {
    fn drop(&mut self) {
        let slot = self
            .session
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(id) = slot
            && let Err(error) = self.api.close_session(id)
        {
            debug!(
                target: TRANSLATE_TARGET,
                session = id,
                error = %error,
                "ignoring session close failure"
            );
        }
    }
}
