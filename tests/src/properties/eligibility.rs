//! # Eligibility Transition Properties
//!
//! Random sequences of account updates, each checked against the rule:
//! losing eligibility leaves zero tokens, anything else leaves the token
//! count unchanged.

use rand::rngs::StdRng;
use rand::Rng;
use shared_types::AccountPatch;

/// A random account update.
pub fn random_patch(rng: &mut StdRng) -> AccountPatch {
    match rng.gen_range(0..4) {
        0 => AccountPatch::active(rng.gen_bool(0.5)),
        1 => AccountPatch::web_access(rng.gen_bool(0.5)),
        2 => AccountPatch {
            active: Some(rng.gen_bool(0.5)),
            web_access: Some(rng.gen_bool(0.5)),
            ..AccountPatch::default()
        },
        _ => AccountPatch::display_name(format!("User {}", rng.gen_range(0..1000))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{account_row, issue_pairs, new_account, portal};
    use fm_03_credential_lifecycle::{Eligibility, Transition};
    use forms_runtime::FormsRuntime;
    use rand::SeedableRng;

    fn run_sequence(seed: u64, steps: usize) {
        let mut rng = StdRng::seed_from_u64(seed);
        let runtime = FormsRuntime::ephemeral().unwrap();
        let app = portal(&runtime, "portal");
        let accounts: Vec<_> = (0..3)
            .map(|i| {
                runtime
                    .create_account(new_account(&format!("user{i}")))
                    .unwrap()
                    .id
            })
            .collect();

        for step in 0..steps {
            let account = accounts[rng.gen_range(0..accounts.len())];
            if rng.gen_bool(0.4) {
                issue_pairs(&runtime, account, app, rng.gen_range(1..3));
            }

            let before = account_row(&runtime, account).unwrap();
            let tokens_before = runtime.token_count(account);
            let others_before: Vec<_> = accounts
                .iter()
                .filter(|other| **other != account)
                .map(|other| runtime.token_count(*other))
                .collect();

            let patch = random_patch(&mut rng);
            let after = runtime.update_account(account, &patch).unwrap();

            let expected = match Transition::for_update(&before, &after) {
                Transition::Revoke => 0,
                Transition::None => tokens_before,
            };
            assert_eq!(
                runtime.token_count(account),
                expected,
                "seed {seed} step {step}: {} -> {} with {patch:?}",
                Eligibility::of(&before),
                Eligibility::of(&after),
            );

            let others_after: Vec<_> = accounts
                .iter()
                .filter(|other| **other != account)
                .map(|other| runtime.token_count(*other))
                .collect();
            assert_eq!(others_before, others_after, "seed {seed} step {step}");
        }

        assert!(runtime.recent_failures().is_empty());
    }

    #[test]
    fn test_random_transitions() {
        for seed in [1, 7, 42, 1337, 0x5EED] {
            run_sequence(seed, 150);
        }
    }

    #[test]
    fn test_eligible_accounts_never_lose_tokens_to_renames() {
        let mut rng = StdRng::seed_from_u64(99);
        let runtime = FormsRuntime::ephemeral().unwrap();
        let app = portal(&runtime, "portal");
        let account = runtime.create_account(new_account("alice")).unwrap().id;
        issue_pairs(&runtime, account, app, 3);

        for _ in 0..50 {
            let patch = AccountPatch::display_name(format!("Alice {}", rng.gen::<u16>()));
            runtime.update_account(account, &patch).unwrap();
        }
        assert_eq!(runtime.token_count(account), 6);
    }
}
