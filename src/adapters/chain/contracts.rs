//! Contract Bindings - Market House, Collateral, Feed, Anchor Store
//!
//! `sol!` interfaces for the four contracts the oracle talks to. Only
//! the functions the oracle calls are declared. Public getters that
//! return structs (`rounds`) are declared with their positional tuple
//! so the generated return type names every field.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IBetHouse {
        function getMarket(bytes32 marketId) external view returns (address feed, bool enabled);
        function currentRoundId() external view returns (uint256);
        function rounds(uint256 roundId) external view returns (
            bytes32 marketId,
            uint256 startTime,
            uint256 endTime,
            int256 priceStart,
            int256 priceEnd,
            uint256 totalYesNet,
            uint256 totalNoNet,
            uint256 feeAccrued,
            bool active,
            bool resolved,
            bool outcomeYes,
            bool refundMode
        );
        function FEE_BET_BPS() external view returns (uint256);
        function ROUND_SECONDS() external view returns (uint256);
        function BET_WINDOW_SECONDS() external view returns (uint256);

        function startRound(bytes32 marketId) external;
        function betYes(uint256 roundId, uint256 amount) external;
        function betNo(uint256 roundId, uint256 amount) external;
        function endRound(uint256 roundId) external;
    }

    #[sol(rpc)]
    interface ICollateral {
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function mint(address to, uint256 amount) external;
    }

    #[sol(rpc)]
    interface IPriceFeed {
        function decimals() external view returns (uint8);
        function updateAnswer(int256 answer) external;
    }

    #[sol(rpc)]
    interface IAnchorStore {
        function setRoundReport(uint256 roundId, string cid) external;
        function setRoundReceipt(uint256 roundId, string cid) external;
        function setRoundChart(uint256 roundId, string cid) external;
    }
}
