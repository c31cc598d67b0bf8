//! Fingerprint short-circuit: prove two leaves equal without fetching both.

use tracing::debug;
use twig_crypto::ContentHasher;
use twig_store::NodeRef;
use twig_types::Fingerprint;

use crate::error::DiffResult;

/// Content of one side as far as the comparison has fetched it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Retrieval {
    NotRetrieved,
    /// `None` means the node or its data does not exist.
    Retrieved(Option<Vec<u8>>),
}

impl Retrieval {
    /// Fetch the content now unless it was fetched already.
    pub(crate) fn resolve(self, node: Option<&NodeRef>) -> DiffResult<Option<Vec<u8>>> {
        match self {
            Self::Retrieved(value) => Ok(value),
            Self::NotRetrieved => read_value(node),
        }
    }
}

/// Outcome of the fingerprint check.
#[derive(Debug)]
pub(crate) enum FingerprintCheck {
    /// Fingerprints matched; the leaves are equal.
    Equal,
    /// No proof of equality. Carries whatever content was read on the way.
    Inconclusive { old: Retrieval, new: Retrieval },
}

/// Compare precomputed fingerprints when at least one side has one.
///
/// A side without a fingerprint is read and hashed so the two can be
/// compared; that content is handed back so it is never read twice. When
/// neither side offers a fingerprint nothing is read.
pub(crate) fn compare_fingerprints(
    old: Option<&NodeRef>,
    new: Option<&NodeRef>,
) -> DiffResult<FingerprintCheck> {
    let mut old_fp = precomputed(old)?;
    let mut new_fp = precomputed(new)?;

    if old_fp.is_none() && new_fp.is_none() {
        return Ok(FingerprintCheck::Inconclusive {
            old: Retrieval::NotRetrieved,
            new: Retrieval::NotRetrieved,
        });
    }

    let mut old_value = Retrieval::NotRetrieved;
    let mut new_value = Retrieval::NotRetrieved;
    if old_fp.is_none() {
        let value = read_value(old)?;
        old_fp = value.as_deref().map(|bytes| ContentHasher::CONTENT.hash(bytes));
        old_value = Retrieval::Retrieved(value);
    }
    if new_fp.is_none() {
        let value = read_value(new)?;
        new_fp = value.as_deref().map(|bytes| ContentHasher::CONTENT.hash(bytes));
        new_value = Retrieval::Retrieved(value);
    }

    if let (Some(old_fp), Some(new_fp)) = (old_fp, new_fp) {
        if old_fp == new_fp {
            debug!(fingerprint = %old_fp, "fingerprints match");
            return Ok(FingerprintCheck::Equal);
        }
    }
    Ok(FingerprintCheck::Inconclusive {
        old: old_value,
        new: new_value,
    })
}

fn precomputed(node: Option<&NodeRef>) -> DiffResult<Option<Fingerprint>> {
    match node {
        Some(node) => Ok(node.fingerprint()?),
        None => Ok(None),
    }
}

/// Read a node's content, mapping "not found" to `None`.
pub(crate) fn read_value(node: Option<&NodeRef>) -> DiffResult<Option<Vec<u8>>> {
    let Some(node) = node else {
        return Ok(None);
    };
    match node.read() {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.is_not_found() => {
            debug!(path = %node.path(), "content not found; treating as absent");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}
