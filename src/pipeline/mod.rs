pub mod stage1_load;
pub mod stage2_describe;
pub mod stage3_infer;
pub mod stage4_plot;
pub mod stage5_report;
