// ==========================================
// 会众管理系统 - 导入结果累加器
// ==========================================
// 每个输入行恰好计入 created / updated / failed 之一
// errors 顺序与输入行顺序一致
// ==========================================

use crate::domain::{ImportSummary, MemberOutcome, RowFailure};
use std::fmt::Display;

#[derive(Debug, Default)]
pub struct ImportAccumulator {
    summary: ImportSummary,
}

impl ImportAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录单行结果
    pub fn record<E: Display>(&mut self, row_number: usize, result: Result<MemberOutcome, E>) {
        self.summary.total += 1;
        match result {
            Ok(MemberOutcome::Created { .. }) => self.summary.created += 1,
            Ok(MemberOutcome::Updated { .. }) => self.summary.updated += 1,
            Err(e) => {
                self.summary.failed += 1;
                self.summary.errors.push(RowFailure {
                    row: row_number,
                    error: e.to_string(),
                });
            }
        }
    }

    /// 已记录的行数
    pub fn total(&self) -> usize {
        self.summary.total
    }

    pub fn finish(self) -> ImportSummary {
        self.summary
    }
}
