// Copyright (c) 2022-2023 The MobileCoin Foundation

use heapless::Vec;

use super::{Error, FinalAck, Phase, Session};

impl Session {
    /// Assemble the signed transaction acknowledgement and wipe the session
    ///
    /// The session is wiped whether or not assembly succeeds.
    #[cfg_attr(feature = "noinline", inline(never))]
    pub(super) fn finalize(&mut self) -> Result<FinalAck, Error> {
        let r = self.assemble();

        self.wipe();
        if r.is_ok() {
            self.set_phase(Phase::Complete);
        }

        r
    }

    fn assemble(&mut self) -> Result<FinalAck, Error> {
        let num_inputs = self.params.as_ref().ok_or(Error::InvalidState)?.num_inputs;
        let message = self.message.take().ok_or(Error::InvalidState)?;

        if self.signatures.len() != num_inputs as usize {
            #[cfg(feature = "log")]
            log::error!(
                "signature count mismatch ({} of {})",
                self.signatures.len(),
                num_inputs
            );

            return Err(Error::InvalidState);
        }

        let signatures = core::mem::replace(&mut self.signatures, Vec::new());

        #[cfg(feature = "log")]
        log::debug!("transaction complete, {} signatures", signatures.len());

        Ok(FinalAck {
            prefix_hash: message.prefix_hash,
            message: message.message,
            signatures,
            digest: self.digest.clone(),
        })
    }
}
