use std::io;
use std::path::Path;
use std::process::Command;

/// 进程执行的抽象，便于在测试中替换真实的 java 可执行文件
pub trait Runner {
    fn run(&self, program: &Path, args: &[&str]) -> io::Result<String>;
}

/// 直接调用系统进程的实现
pub struct ExecRunner;

impl Runner for ExecRunner {
    fn run(&self, program: &Path, args: &[&str]) -> io::Result<String> {
        let output = Command::new(program).args(args).output()?;
        // java -version 把版本信息写到 stderr，合并两路输出
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(combined)
    }
}
