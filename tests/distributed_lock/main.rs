mod exclusion;
mod reentrancy;
