//! Pool lifecycle scenarios driven through the scheduler and simulated clock

mod capacity;
