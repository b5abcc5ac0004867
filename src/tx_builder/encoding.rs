//! Transaction encodings
//!
//! The ledger accepts two wire shapes: the legacy message format and the
//! versioned v0 format. Some node configurations reject the legacy encoding
//! under certain payload sizes, so the submission path falls back to v0 on
//! submission-layer errors. The choice is an explicit variant with one
//! construction function per shape rather than a conditional branch buried
//! in the submit loop.
//!
//! Construction always produces a NEW signed transaction bound to the given
//! blockhash; nothing is re-signed in place.

use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    message::{v0, Message, VersionedMessage},
    pubkey::Pubkey,
    signature::Keypair,
    transaction::VersionedTransaction,
};

use super::errors::SubmitError;

/// Wire shape for a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxEncoding {
    /// Original message format.
    Legacy,
    /// Versioned v0 message format (the fallback shape).
    V0,
}

impl TxEncoding {
    /// Build and sign a transaction in this encoding.
    ///
    /// The signature binds to `recent_blockhash`; callers must fetch a fresh
    /// hash for every build (a hash is single-use per signature).
    pub fn build_signed(
        &self,
        instructions: &[Instruction],
        fee_payer: &Pubkey,
        recent_blockhash: Hash,
        signer: &Keypair,
    ) -> Result<VersionedTransaction, SubmitError> {
        let message = match self {
            TxEncoding::Legacy => VersionedMessage::Legacy(Message::new_with_blockhash(
                instructions,
                Some(fee_payer),
                &recent_blockhash,
            )),
            TxEncoding::V0 => VersionedMessage::V0(
                v0::Message::try_compile(fee_payer, instructions, &[], recent_blockhash)
                    .map_err(|e| SubmitError::Signing(format!("v0 compile failed: {e}")))?,
            ),
        };

        VersionedTransaction::try_new(message, &[signer])
            .map_err(|e| SubmitError::Signing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{instruction::AccountMeta, signer::Signer};

    fn sample_ix() -> Instruction {
        Instruction::new_with_bytes(
            Pubkey::new_unique(),
            &[7, 7, 7],
            vec![AccountMeta::new(Pubkey::new_unique(), false)],
        )
    }

    #[test]
    fn test_legacy_shape() {
        let signer = Keypair::new();
        let hash = Hash::new_unique();

        let tx = TxEncoding::Legacy
            .build_signed(&[sample_ix()], &signer.pubkey(), hash, &signer)
            .unwrap();

        assert!(matches!(tx.message, VersionedMessage::Legacy(_)));
        assert_eq!(*tx.message.recent_blockhash(), hash);
        assert_eq!(tx.signatures.len(), 1);
    }

    #[test]
    fn test_v0_shape() {
        let signer = Keypair::new();
        let hash = Hash::new_unique();

        let tx = TxEncoding::V0
            .build_signed(&[sample_ix()], &signer.pubkey(), hash, &signer)
            .unwrap();

        assert!(matches!(tx.message, VersionedMessage::V0(_)));
        assert_eq!(*tx.message.recent_blockhash(), hash);
    }

    #[test]
    fn test_both_encodings_bind_same_instructions() {
        let signer = Keypair::new();
        let hash = Hash::new_unique();
        let ix = sample_ix();

        let legacy = TxEncoding::Legacy
            .build_signed(std::slice::from_ref(&ix), &signer.pubkey(), hash, &signer)
            .unwrap();
        let v0 = TxEncoding::V0
            .build_signed(std::slice::from_ref(&ix), &signer.pubkey(), hash, &signer)
            .unwrap();

        let legacy_progs: Vec<_> = legacy
            .message
            .instructions()
            .iter()
            .map(|ci| ci.program_id_index)
            .collect();
        let v0_progs: Vec<_> = v0
            .message
            .instructions()
            .iter()
            .map(|ci| ci.program_id_index)
            .collect();
        assert_eq!(legacy.message.instructions().len(), 1);
        assert_eq!(legacy_progs.len(), v0_progs.len());
    }

    #[test]
    fn test_signature_binds_to_blockhash() {
        // A new blockhash must produce a new signature: hashes are
        // single-use per signature.
        let signer = Keypair::new();
        let ix = sample_ix();

        let first = TxEncoding::Legacy
            .build_signed(
                std::slice::from_ref(&ix),
                &signer.pubkey(),
                Hash::new_unique(),
                &signer,
            )
            .unwrap();
        let second = TxEncoding::Legacy
            .build_signed(
                std::slice::from_ref(&ix),
                &signer.pubkey(),
                Hash::new_unique(),
                &signer,
            )
            .unwrap();

        assert_ne!(first.signatures[0], second.signatures[0]);
    }
}
