/// Bootstrapped n-step returns of a segment of rewards
///
/// Scans the rewards backward from `bootstrap`:
///
/// R<sub>t</sub> = r<sub>t</sub> + γ R<sub>t+1</sub>, with R<sub>L</sub> = bootstrap
///
/// and yields one return per reward, in the original chronological order.
pub fn discounted_returns(rewards: &[f32], gamma: f32, bootstrap: f32) -> Vec<f32> {
    let mut returns = rewards
        .iter()
        .rev()
        .scan(bootstrap, |r, &reward| {
            *r = reward + gamma * *r;
            Some(*r)
        })
        .collect::<Vec<_>>();
    returns.reverse();
    returns
}
