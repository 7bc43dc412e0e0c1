//! Role classification of a resolved sender.

use std::collections::HashSet;

use tracing::debug;

use super::keys::KeyError;
use super::request::ResolvedIdentity;
use super::types::{BasicAcl, Operation, Role, UserId};

/// Maps a resolved sender to its role for a container.
///
/// Holds the system tier (inner ring and container nodes) as derived user
/// ids. Built once at startup and shared read-only between requests.
#[derive(Debug, Clone, Default)]
pub struct RoleClassifier {
    system_ids: HashSet<UserId>,
}

impl RoleClassifier {
    pub fn new<I>(system_keys: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let mut classifier = Self::default();
        for key in system_keys {
            classifier.system_ids.insert(UserId::from_public_key(&key)?);
        }
        Ok(classifier)
    }

    pub fn system_len(&self) -> usize {
        self.system_ids.len()
    }

    fn is_system(&self, sender: &ResolvedIdentity) -> bool {
        self.system_ids.contains(sender.user_id())
    }

    /// Classify `sender` against the container owner.
    ///
    /// Ownership is byte equality of user ids and is checked first, so an
    /// owner that also runs a system node is still `Owner`. The basic ACL and
    /// operation do not affect the tier; they are recorded for audit.
    pub fn classify_role(
        &self,
        sender: &ResolvedIdentity,
        container_owner: &UserId,
        basic_acl: BasicAcl,
        operation: Operation,
    ) -> Role {
        let role = if sender.user_id() == container_owner {
            Role::Owner
        } else if self.is_system(sender) {
            Role::ContainerSystem
        } else {
            Role::Other
        };

        debug!(
            sender = %sender.user_id(),
            owner = %container_owner,
            %basic_acl,
            %operation,
            %role,
            "classified request sender"
        );

        role
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use proptest::prelude::*;

    fn raw_key(seed: u8) -> Vec<u8> {
        SigningKey::from_bytes(&[seed; 32])
            .verifying_key()
            .to_bytes()
            .to_vec()
    }

    fn identity(seed: u8) -> ResolvedIdentity {
        ResolvedIdentity::from_key(&raw_key(seed), "test key").unwrap()
    }

    const ACL: BasicAcl = BasicAcl::from_bits(0x1fbf_8fff);

    #[test]
    fn owner_on_put() {
        let sender = identity(3);
        let owner = *sender.user_id();

        let role = RoleClassifier::default().classify_role(&sender, &owner, ACL, Operation::Put);
        assert_eq!(role, Role::Owner);
    }

    #[test]
    fn system_key_is_container_system() {
        let classifier = RoleClassifier::new([raw_key(9)]).unwrap();
        let owner = *identity(1).user_id();

        assert_eq!(classifier.system_len(), 1);
        assert_eq!(
            classifier.classify_role(&identity(9), &owner, ACL, Operation::Get),
            Role::ContainerSystem
        );
        assert_eq!(
            classifier.classify_role(&identity(2), &owner, ACL, Operation::Get),
            Role::Other
        );
    }

    #[test]
    fn owner_beats_system_membership() {
        let classifier = RoleClassifier::new([raw_key(1)]).unwrap();
        let owner = *identity(1).user_id();

        assert_eq!(
            classifier.classify_role(&identity(1), &owner, ACL, Operation::Delete),
            Role::Owner
        );
    }

    #[test]
    fn system_tier_is_keyed_by_user_id() {
        let classifier = RoleClassifier::new([raw_key(9), raw_key(9), raw_key(8)]).unwrap();
        assert_eq!(classifier.system_len(), 2);
    }

    #[test]
    fn invalid_system_key_is_rejected() {
        assert!(RoleClassifier::new([vec![1, 2, 3]]).is_err());
    }

    proptest! {
        #[test]
        fn owner_iff_ids_are_equal(sender_seed in any::<u8>(), owner_seed in any::<u8>()) {
            let sender = identity(sender_seed);
            let owner = *identity(owner_seed).user_id();

            let role = RoleClassifier::default().classify_role(&sender, &owner, ACL, Operation::Head);
            prop_assert_eq!(role == Role::Owner, sender.user_id() == &owner);
            prop_assert_eq!(role == Role::Owner, sender_seed == owner_seed);
        }
    }
}
