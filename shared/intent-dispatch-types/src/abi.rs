//! Solidity ABI surface of the dispatcher, the delegated account and their collaborators.
//!
//! Calldata, return data, revert payloads and logs are all encoded with these definitions, so
//! an intent built off-host decodes identically inside the execution host.

use alloy_sol_types::sol;

sol! {
    #![sol(all_derives)]

    /// ERC-4337 (v0.7) packed user operation: the wire form of an [`crate::Intent`].
    #[sol(all_derives)]
    struct PackedUserOperation {
        address sender;
        uint256 nonce;
        bytes initCode;
        bytes callData;
        bytes32 accountGasLimits;
        uint256 preVerificationGas;
        bytes32 gasFees;
        bytes paymasterAndData;
        bytes signature;
    }

    /// Raised by any contract that receives calldata it has no entry point for.
    #[sol(all_derives)]
    error UnknownSelector(bytes4 selector);

    #[sol(all_derives)]
    interface IDispatcher {
        event IntentExecuted(bytes32 indexed fingerprint, address indexed sender, uint256 sequence, bytes result);
        event IntentReverted(bytes32 indexed fingerprint, address indexed sender, uint256 sequence, bytes reason);
        event BatchProcessed(address indexed beneficiary, uint256 intents, uint256 reverted);

        error EmptyBatch();
        error Reentrancy();
        error InvalidSequence(uint256 opIndex, uint256 expected, uint256 provided);
        error SenderNotDeployed(uint256 opIndex, address sender);
        error SignatureValidationFailed(uint256 opIndex, uint256 validationData);
        error PrefundNotPaid(uint256 opIndex, uint256 required, uint256 received);
        error MalformedValidationResult(uint256 opIndex);
        error SelfCallOnly(address caller);

        function handleOps(PackedUserOperation[] ops, address beneficiary) external;
        function innerHandleOp(PackedUserOperation op, bytes32 fingerprint, uint256 opIndex) external returns (bytes result);
        function getUserOpHash(PackedUserOperation userOp) external view returns (bytes32);
        function getNonce(address sender) external view returns (uint256);
    }

    #[sol(all_derives)]
    interface IDelegatedAccount {
        event ControllerChanged(address indexed previous, address indexed current);

        error Unauthorized(address caller);
        error NotController(address caller);
        error ZeroController();

        function validateUserOp(PackedUserOperation userOp, bytes32 userOpHash, uint256 missingAccountFunds)
            external
            returns (uint256 validationData);
        function execute(address dest, uint256 value, bytes func) external;
        function executeDelegate(address dest, bytes func) external;
        function setController(address newController) external;
        function controller() external view returns (address);
        function dispatcher() external view returns (address);
    }

    #[sol(all_derives)]
    interface IActionExecutor {
        error ApproveRejected(address resource, address sink, uint256 amount);

        function performCompoundAction(address resource, address sink, uint256 amount, address beneficiary)
            external
            returns (uint256 quantity);
    }

    #[sol(all_derives)]
    interface IResourceToken {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);

        error InsufficientBalance(address account, uint256 balance, uint256 needed);
        error InsufficientAllowance(address spender, uint256 allowance, uint256 needed);
        error NotMinter(address caller);

        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function mint(address to, uint256 amount) external;
    }

    #[sol(all_derives)]
    interface IVault {
        event Deposit(address indexed sender, address indexed owner, uint256 assets, uint256 shares);

        error ZeroDeposit();
        error ZeroShares(uint256 assets);
        error DepositCapExceeded(uint256 cap, uint256 requested);
        error ShareMathOverflow(uint256 assets, uint256 supply);

        function asset() external view returns (address);
        function totalAssets() external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
        function deposit(uint256 assets, address receiver) external returns (uint256 shares);
    }
}

// `sol!` skips `all_derives` on empty return structs; this is the `Debug` derive written out.
impl core::fmt::Debug for IResourceToken::mintReturn {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("mintReturn").finish()
    }
}
