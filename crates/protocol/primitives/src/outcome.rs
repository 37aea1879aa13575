//! Classification of [`ExecTxResult`]s.
//!
//! A failed execution result may still belong in the Ethereum view of a block when the
//! transaction was charged for its gas, which is the case when it ran out of block gas or
//! failed while committing the state database.

use crate::ExecTxResult;

/// Log marker of a transaction that exceeded the remaining block gas.
pub const BLOCK_GAS_EXCEEDED_LOG: &str = "out of gas in location: block gas meter; gasWanted:";

/// Log marker of a transaction whose state database commit failed.
pub const STATE_DB_COMMIT_FAILED_LOG: &str = "failed to commit stateDB";

/// Log marker of a transaction rejected because no block gas was left.
pub const NO_BLOCK_GAS_LEFT_LOG: &str = "no block gas left to run tx: out of gas";

/// The SDK out-of-gas response code.
pub const OUT_OF_GAS_CODE: u32 = 11;

impl ExecTxResult {
    /// Returns true if the execution succeeded.
    pub const fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Returns true if the transaction exceeded the block gas limit.
    pub fn exceeds_block_gas_limit(&self) -> bool {
        self.log.contains(BLOCK_GAS_EXCEEDED_LOG)
    }

    /// Returns true if the transaction failed to commit its state.
    pub fn state_db_commit_failed(&self) -> bool {
        self.log.contains(STATE_DB_COMMIT_FAILED_LOG)
    }

    /// Returns true if the result belongs in the Ethereum view of the block.
    pub fn is_success_or_expected_failure(&self) -> bool {
        self.is_success() || self.exceeds_block_gas_limit() || self.state_db_commit_failed()
    }

    /// Returns true if the block ran out of gas before this transaction. Its reported gas
    /// must not be counted, and neither must the gas of any later transaction in the block.
    pub fn should_ignore_gas_used(&self) -> bool {
        self.code == OUT_OF_GAS_CODE && self.log.contains(NO_BLOCK_GAS_LEFT_LOG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn result(code: u32, log: &str) -> ExecTxResult {
        ExecTxResult { code, log: log.to_string(), ..Default::default() }
    }

    #[rstest]
    #[case::success(0, "", true)]
    #[case::block_gas(11, "out of gas in location: block gas meter; gasWanted: 100", true)]
    #[case::commit(1, "failed to commit stateDB: boom", true)]
    #[case::reverted(5, "execution reverted", false)]
    #[case::no_block_gas(11, "no block gas left to run tx: out of gas", false)]
    fn test_success_or_expected_failure(
        #[case] code: u32,
        #[case] log: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(result(code, log).is_success_or_expected_failure(), expected);
    }

    #[rstest]
    #[case::matching(11, "no block gas left to run tx: out of gas", true)]
    #[case::other_code(5, "no block gas left to run tx: out of gas", false)]
    #[case::other_log(11, "out of gas", false)]
    fn test_should_ignore_gas_used(#[case] code: u32, #[case] log: &str, #[case] expected: bool) {
        assert_eq!(result(code, log).should_ignore_gas_used(), expected);
    }
}
