use anyhow::Context;
use road_fcn::config::TrainConfig;
use road_fcn::{fcn, logging};

fn main() -> anyhow::Result<()> {
    logging::init("info");
    let config = TrainConfig::from_cli().context("读取训练配置失败")?;
    let summary = fcn::run(&config).context("训练失败")?;
    println!(
        "训练完成：共{}步，最后一步损失{}；推理样例保存在{}",
        summary.train.steps,
        summary
            .train
            .last_loss
            .map_or_else(|| "-".to_string(), |loss| format!("{loss:.3}")),
        summary.output_dir.display()
    );
    Ok(())
}
