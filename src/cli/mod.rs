//! CLI infrastructure for the 5x5 Tic-Tac-Toe Q-learning toolkit
//!
//! This module provides the command-line interface for training, evaluating,
//! playing against and inspecting tabular Q-learning agents.

pub mod commands;
pub mod output;
