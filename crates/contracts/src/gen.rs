use ethers::contract::abigen;

abigen!(
    EntryPointAPI,
    r#"[
        struct UserOperation {address sender;uint256 nonce;bytes initCode;bytes callData;uint256 callGasLimit;uint256 verificationGasLimit;uint256 preVerificationGas;uint256 maxFeePerGas;uint256 maxPriorityFeePerGas;bytes paymasterAndData;bytes signature;}
        function handleOps(UserOperation[] calldata ops,address payable beneficiary) external
        function balanceOf(address account) external view returns (uint256)
        function depositTo(address account) external payable
        function getSenderAddress(bytes memory initCode) external
        function getUserOpHash(UserOperation calldata userOp) external view returns (bytes32)
        function getNonce(address sender, uint192 key) public view returns (uint256 nonce)
        error FailedOp(uint256 opIndex, string reason)
        error SenderAddressResult(address sender)
        event UserOperationEvent(bytes32 indexed userOpHash,address indexed sender,address indexed paymaster,uint256 nonce,bool success,uint256 actualGasCost,uint256 actualGasUsed)
        event UserOperationRevertReason(bytes32 indexed userOpHash,address indexed sender,uint256 nonce,bytes revertReason)
        event AccountDeployed(bytes32 indexed userOpHash,address indexed sender,address factory,address paymaster)
    ]"#
);

abigen!(
    SimpleAccountAPI,
    r#"[
        function execute(address dest,uint256 value,bytes calldata func) external
        function executeBatch(address[] calldata dest,bytes[] calldata func) external
        function getNonce() public view returns (uint256)
    ]"#
);

abigen!(
    SimpleAccountFactoryAPI,
    r#"[
        function createAccount(address owner,uint256 salt) public returns (address)
        function getAddress(address owner,uint256 salt) public view returns (address)
    ]"#
);

abigen!(
    PasskeyAccountFactoryAPI,
    r#"[
        function createAccount(uint256 x,uint256 y,uint256 salt) public returns (address)
        function getAddress(uint256 x,uint256 y,uint256 salt) public view returns (address)
    ]"#
);
