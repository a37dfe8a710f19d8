//! Property tests for lease transitions.

use proptest::prelude::*;

use namereg::store::{MemoryStore, Store};
use namereg::{Lifecycle, Registry, RegistryConfig, RegistryError};
use namereg_testkit::generators::{duration, owner_id};
use namereg_testkit::RegistrationParams;

const GRACE: u64 = 90 * 86_400;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Runtime::new().unwrap()
}

fn registry() -> Registry<MemoryStore> {
    Registry::new(MemoryStore::new(), RegistryConfig::default()).unwrap()
}

proptest! {
    /// A renewal either leaves the name live past `now` or changes nothing.
    #[test]
    fn test_renewal_never_leaves_name_expired(
        params: RegistrationParams,
        extra in duration(),
        late in 0u64..=GRACE,
    ) {
        runtime().block_on(async {
            let reg = registry();
            let owner = params.keypair.owner_id();
            let record = reg.register(&params.name, params.duration, owner, params.now).await.unwrap();
            let now = record.expires_at + late;

            match reg.renew(&params.name, extra, owner, now).await {
                Ok(renewed) => {
                    prop_assert!(renewed.expires_at > now);
                    prop_assert_eq!(renewed.expires_at, record.expires_at + extra);
                    prop_assert_eq!(reg.lifecycle(&params.name, now).await.unwrap(), Lifecycle::Registered);
                }
                Err(err) => {
                    prop_assert!(matches!(
                        err,
                        RegistryError::InvalidDuration(_) | RegistryError::NotFound(_)
                    ));
                    prop_assert_eq!(reg.store().get_any(&record.key).await.unwrap(), Some(record));
                }
            }
            Ok(())
        })?;
    }

    /// Only the current holder can extend a lease.
    #[test]
    fn test_only_holder_renews(params: RegistrationParams, rival in owner_id(), extra in duration()) {
        prop_assume!(rival != params.keypair.owner_id());
        runtime().block_on(async {
            let reg = registry();
            let record = reg
                .register(&params.name, params.duration, params.keypair.owner_id(), params.now)
                .await
                .unwrap();

            let err = reg.renew(&params.name, extra, rival, params.now + 1).await.unwrap_err();
            prop_assert!(matches!(err, RegistryError::Unauthorized(_)));
            prop_assert_eq!(reg.store().get_any(&record.key).await.unwrap(), Some(record));
            Ok(())
        })?;
    }
}
